//! # Veil
//!
//! Selectively-redactable semantic envelopes.
//!
//! ## Overview
//!
//! An envelope is an immutable tree of content-addressed nodes: a subject
//! plus a set of predicate-object assertions about it, nested arbitrarily.
//! Any node can be:
//!
//! - **Elided**: replaced by its digest
//! - **Encrypted**: sealed under a symmetric key, digest as associated data
//! - **Compressed**: zstd-compressed, digest retained
//!
//! and the root digest does not change. A signature over a digest therefore
//! outlives any later redaction of what it covers.
//!
//! ## Key Concepts
//!
//! - **Digest**: the semantic identity of a node, independent of obscuring
//! - **Assertion**: `predicate: object`, kept sorted by digest under a subject
//! - **Wrapping**: making a whole envelope the subject of new assertions
//! - **Salt**: random assertion that defeats digest guessing
//! - **Proof**: an elided copy showing a digest occurs in a tree
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashSet;
//! use veil::Envelope;
//!
//! let alice = Envelope::new("Alice")
//!     .add_assertion("knows", "Bob")
//!     .add_assertion("age", 30);
//!
//! let age = alice.assertion_with_predicate("age").unwrap();
//! let redacted = alice.elide_removing_set(&HashSet::from([age.digest()]));
//!
//! assert_eq!(redacted.digest(), alice.digest());
//! assert!(redacted.object_for_predicate("age").is_err());
//! ```
//!
//! ## Re-exports
//!
//! - `veil::core` - primitives (digests, keys, canonical CBOR, known values)

pub mod assertion;
pub mod cbor;
pub mod compress;
pub mod config;
pub mod elide;
pub mod encodable;
pub mod encrypt;
pub mod envelope;
pub mod error;
pub mod proof;
pub mod queries;
pub mod recipient;
pub mod salt;
pub mod signature;
pub mod walk;

pub use veil_core as core;
pub use veil_core::known_value;

pub use assertion::Assertion;
pub use config::EnvelopeConfig;
pub use elide::{ElideMode, ObscureAction, ObscureType};
pub use encodable::EnvelopeEncodable;
pub use envelope::{DigestCell, DigestProvider, Envelope, EnvelopeCase};
pub use error::{EnvelopeError, Result};
pub use walk::EdgeType;

pub use veil_core::{
    Digest, KnownValue, Keypair, PublicKey, Salt, Signature, SymmetricKey, X25519PublicKey,
    X25519StaticSecret,
};
