//! zstd compression bound to a digest.
//!
//! ## Security
//!
//! - The declared uncompressed size is checked against the configured bound
//!   before inflating, and inflation never allocates past it
//! - Compressed payloads larger than [`MAX_COMPRESSED_SIZE`] are rejected
//!   unread

use bytes::Bytes;
use ciborium::value::Value;

use crate::config::{CompressionConfig, MAX_COMPRESSED_SIZE};
use crate::digest::Digest;
use crate::error::{CoreError, Result};
use crate::tags;

/// Compressed bytes plus the digest of what they inflate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    compressed: Bytes,
    uncompressed_size: usize,
    digest: Digest,
}

impl CompressedData {
    /// Compress `data`, recording `digest` as the identity of the content.
    pub fn compress(data: &[u8], digest: Digest, config: &CompressionConfig) -> Result<Self> {
        if data.len() > config.max_decompressed_size {
            return Err(CoreError::SizeLimitExceeded {
                size: data.len(),
                max: config.max_decompressed_size,
            });
        }

        let compressed = zstd::encode_all(data, config.level.clamp(1, 22))
            .map_err(|e| CoreError::CompressionError(e.to_string()))?;

        Ok(Self {
            compressed: Bytes::from(compressed),
            uncompressed_size: data.len(),
            digest,
        })
    }

    /// Inflate back to the original bytes.
    pub fn decompress(&self, config: &CompressionConfig) -> Result<Vec<u8>> {
        if self.compressed.len() > MAX_COMPRESSED_SIZE {
            return Err(CoreError::SizeLimitExceeded {
                size: self.compressed.len(),
                max: MAX_COMPRESSED_SIZE,
            });
        }
        if self.uncompressed_size > config.max_decompressed_size {
            return Err(CoreError::SizeLimitExceeded {
                size: self.uncompressed_size,
                max: config.max_decompressed_size,
            });
        }

        let data = zstd::bulk::decompress(&self.compressed, self.uncompressed_size)
            .map_err(|e| CoreError::DecompressionError(e.to_string()))?;

        if data.len() != self.uncompressed_size {
            return Err(CoreError::DecompressionError(format!(
                "inflated to {} bytes, expected {}",
                data.len(),
                self.uncompressed_size
            )));
        }
        Ok(data)
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    pub fn compressed(&self) -> &[u8] {
        &self.compressed
    }

    pub fn compressed_len(&self) -> usize {
        self.compressed.len()
    }

    pub fn uncompressed_size(&self) -> usize {
        self.uncompressed_size
    }

    /// Ratio of compressed to original size (lower is better).
    pub fn compression_ratio(&self) -> f64 {
        if self.uncompressed_size == 0 {
            1.0
        } else {
            self.compressed.len() as f64 / self.uncompressed_size as f64
        }
    }

    /// Tagged CBOR form: `40003([data, size, digest])`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(
            tags::COMPRESSED,
            Box::new(Value::Array(vec![
                Value::Bytes(self.compressed.to_vec()),
                Value::Integer((self.uncompressed_size as u64).into()),
                self.digest.to_cbor_value(),
            ])),
        )
    }

    /// Parse the tagged CBOR form.
    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        let items = match value {
            Value::Tag(tags::COMPRESSED, inner) => match inner.as_ref() {
                Value::Array(items) if items.len() == 3 => items,
                _ => return Err(CoreError::Malformed("compressed data must be a 3-array".into())),
            },
            _ => return Err(CoreError::Malformed("expected tagged compressed data".into())),
        };

        let compressed = match &items[0] {
            Value::Bytes(b) => Bytes::from(b.clone()),
            _ => return Err(CoreError::Malformed("compressed payload is not bytes".into())),
        };
        let uncompressed_size = match &items[1] {
            Value::Integer(i) => {
                let n: i128 = (*i).into();
                usize::try_from(n)
                    .map_err(|_| CoreError::Malformed(format!("invalid uncompressed size: {n}")))?
            }
            _ => return Err(CoreError::Malformed("uncompressed size is not an integer".into())),
        };
        let digest = Digest::from_cbor_value(&items[2])?;

        Ok(Self {
            compressed,
            uncompressed_size,
            digest,
        })
    }
}
