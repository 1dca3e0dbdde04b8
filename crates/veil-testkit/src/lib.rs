//! # Veil Testkit
//!
//! Testing utilities for Veil envelopes.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known envelopes with expected digests for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic keys and sample envelopes
//!
//! ## Golden Vectors
//!
//! ```rust
//! use veil_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     let envelope = (vector.build)();
//!     println!("{}: {}", vector.name, envelope.digest().to_hex());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use veil_testkit::generators::envelope;
//!
//! proptest! {
//!     #[test]
//!     fn elide_keeps_digest(e in envelope()) {
//!         prop_assert_eq!(e.elide().digest(), e.digest());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use veil_testkit::fixtures::EnvelopeFixture;
//!
//! let fixture = EnvelopeFixture::with_seed([7; 32]);
//! let credential = fixture.signed_credential();
//! assert!(credential.verify(&fixture.issuer.public_key()).is_ok());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{alice_knows_bob, multi_party_fixtures, EnvelopeFixture};
pub use generators::{envelope, envelope_with_targets};
pub use vectors::{all_vectors, verify_all_vectors, vectors_json, GoldenVector};
