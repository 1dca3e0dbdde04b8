//! Error types for envelope operations.

use thiserror::Error;
use veil_core::{CoreError, Digest};

/// Errors that can occur while building, querying or transforming envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    // ── Structural ──────────────────────────────────────────────────────────
    #[error("envelope is not wrapped")]
    NotWrapped,

    #[error("envelope subject is not a leaf")]
    NotLeaf,

    #[error("envelope is not an assertion")]
    NotAssertion,

    #[error("envelope is not a known value")]
    NotKnownValue,

    #[error("envelope is not encrypted")]
    NotEncrypted,

    #[error("envelope is not compressed")]
    NotCompressed,

    #[error("envelope is already elided")]
    AlreadyElided,

    #[error("envelope is already encrypted")]
    AlreadyEncrypted,

    /// Something other than an assertion or an obscured envelope was placed
    /// where an assertion is expected.
    #[error("only assertions or obscured envelopes may stand in for assertions")]
    InvalidAssertion,

    // ── Lookup ──────────────────────────────────────────────────────────────
    #[error("assertion not found")]
    AssertionNotFound,

    #[error("more than one assertion matches the predicate")]
    AmbiguousAssertion,

    #[error("target digest not found: {0}")]
    TargetNotFound(Digest),

    // ── Integrity ───────────────────────────────────────────────────────────
    /// Recovered content does not hash back to the digest it was carried under.
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    #[error("no signature from the given key verifies")]
    UnverifiedSignature,

    #[error("no recipient entry opens with the given key")]
    NoMatchingRecipient,

    // ── Format ──────────────────────────────────────────────────────────────
    #[error("invalid envelope format: {0}")]
    InvalidFormat(String),

    #[error("non-canonical envelope encoding: {0}")]
    NonCanonical(String),

    #[error("could not extract value: {0}")]
    Extraction(String),

    /// Codec, cipher and compressor failures, propagated unchanged.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl EnvelopeError {
    /// True when the cipher rejected the key or the ciphertext.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, EnvelopeError::Core(CoreError::AuthenticationFailed))
    }
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
