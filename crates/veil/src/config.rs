//! Envelope engine configuration.

use veil_core::CompressionConfig;

/// Settings for decoding and compressing envelopes.
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Compressor level and decompression bound.
    pub compression: CompressionConfig,
    /// Reject encodings that do not re-encode byte-for-byte.
    pub require_canonical: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            compression: CompressionConfig::default(),
            require_canonical: true,
        }
    }
}
