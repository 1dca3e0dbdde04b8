//! Compression of envelope nodes.

use veil_core::CompressedData;

use crate::config::EnvelopeConfig;
use crate::encrypt::check_recovered_digest;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// Compress this node with the default configuration.
    pub fn compress(&self) -> Result<Envelope> {
        self.compress_with(&EnvelopeConfig::default())
    }

    /// Compress this node. Compressing a compressed node is a no-op.
    pub fn compress_with(&self, config: &EnvelopeConfig) -> Result<Envelope> {
        match self.case() {
            EnvelopeCase::Compressed(_) => return Ok(self.clone()),
            EnvelopeCase::Elided(_) => return Err(EnvelopeError::AlreadyElided),
            EnvelopeCase::Encrypted { .. } => return Err(EnvelopeError::AlreadyEncrypted),
            _ => {}
        }
        let data = self.to_cbor_data();
        let compressed = CompressedData::compress(&data, self.digest(), &config.compression)?;
        tracing::trace!(
            digest = %self.digest().short_description(),
            from = data.len(),
            to = compressed.compressed_len(),
            "compressed node"
        );
        Ok(Envelope::new_compressed(compressed))
    }

    pub fn decompress(&self) -> Result<Envelope> {
        self.decompress_with(&EnvelopeConfig::default())
    }

    /// Inflate and check the result against the carried digest.
    pub fn decompress_with(&self, config: &EnvelopeConfig) -> Result<Envelope> {
        let compressed = match self.case() {
            EnvelopeCase::Compressed(compressed) => compressed,
            _ => return Err(EnvelopeError::NotCompressed),
        };
        let data = compressed.decompress(&config.compression)?;
        let envelope = Envelope::from_cbor_data_with(&data, config)?;
        check_recovered_digest(compressed.digest(), &envelope)?;
        Ok(envelope)
    }

    pub fn compress_subject(&self) -> Result<Envelope> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => Ok(Envelope::new_node_unchecked(
                subject.compress()?,
                assertions.clone(),
            )),
            _ => self.compress(),
        }
    }

    pub fn decompress_subject(&self) -> Result<Envelope> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => Ok(Envelope::new_node_unchecked(
                subject.decompress()?,
                assertions.clone(),
            )),
            _ => self.decompress(),
        }
    }
}
