//! # Veil Core
//!
//! Pure primitives underneath Veil envelopes: digests, canonical CBOR,
//! authenticated encryption, compression, salts and known values.
//!
//! This crate contains no I/O and knows nothing about the envelope tree. It is
//! the set of collaborators the envelope engine is built on.
//!
//! ## Key Types
//!
//! - [`Digest`] - 32-byte Blake3 content address, totally ordered
//! - [`SymmetricKey`] / [`EncryptedMessage`] - ChaCha20-Poly1305 with associated data
//! - [`CompressedData`] - zstd-compressed bytes bound to a digest
//! - [`Salt`] - random decorrelation bytes
//! - [`KnownValue`] - compact enumerated predicates
//!
//! ## Canonicalization
//!
//! Every value that is hashed or transmitted is encoded with deterministic
//! CBOR. See the [`canonical`] module.

pub mod canonical;
pub mod compress;
pub mod config;
pub mod crypto;
pub mod digest;
pub mod error;
pub mod known_value;
pub mod salt;
pub mod signing;
pub mod tags;

pub use canonical::{canonical_bytes, decode_value};
pub use compress::CompressedData;
pub use config::CompressionConfig;
pub use crypto::{
    EncryptedMessage, EphemeralKeyPair, Nonce, SealedMessage, SymmetricKey, X25519PublicKey,
    X25519StaticSecret,
};
pub use digest::{Digest, DigestKind};
pub use error::{CoreError, Result};
pub use known_value::{KnownValue, KnownValuesStore};
pub use salt::Salt;
pub use signing::{Keypair, PublicKey, Signature};
