//! Error types for Veil Core.

use thiserror::Error;

/// Errors raised by the collaborators: codec, ciphers, compressor, keys.
#[derive(Debug, Error)]
pub enum CoreError {
    /// AEAD tag verification failed (wrong key, wrong nonce, or tampering).
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid length for {what}: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("salt too short: {0} bytes (minimum {})", crate::config::MIN_SALT_LEN)]
    SaltTooShort(usize),

    #[error("compression error: {0}")]
    CompressionError(String),

    #[error("decompression error: {0}")]
    DecompressionError(String),

    #[error("size limit exceeded: {size} bytes (max {max})")]
    SizeLimitExceeded { size: usize, max: usize },

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("non-canonical encoding: {0}")]
    NonCanonical(String),

    #[error("malformed value: {0}")]
    Malformed(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
