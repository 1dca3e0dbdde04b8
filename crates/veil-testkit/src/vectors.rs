//! Golden test vectors for deterministic verification.
//!
//! These vectors ensure that canonical encoding and digesting produce
//! identical results across all implementations.

use serde::Serialize;

use veil::{known_value, Envelope};
use veil_core::{Nonce, SymmetricKey};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Builds the envelope under test.
    pub build: fn() -> Envelope,
    /// Expected digest (hex). Empty means "report only".
    pub expected_digest: &'static str,
}

fn text_leaf() -> Envelope {
    Envelope::new("Hello.")
}

fn alice_knows_bob() -> Envelope {
    crate::fixtures::alice_knows_bob()
}

fn wrapped_with_note() -> Envelope {
    alice_knows_bob()
        .wrap()
        .add_assertion(known_value::NOTE, "wrapped")
}

fn subject_elided() -> Envelope {
    let e = alice_knows_bob();
    e.elide_removing_target(&e.subject())
}

fn subject_encrypted() -> Envelope {
    let key = SymmetricKey::from_bytes([0x42; 32]);
    let e = alice_knows_bob();
    let subject = e
        .subject()
        .encrypt_with_nonce(&key, Nonce::from_bytes([0x01; 12]))
        .expect("leaf encrypts");
    e.replace_subject(subject).expect("encrypted subject is valid")
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Text leaf",
            build: text_leaf,
            expected_digest: "",
        },
        GoldenVector {
            name: "Alice knows Bob, age 30",
            build: alice_knows_bob,
            expected_digest: "",
        },
        GoldenVector {
            name: "Wrapped with note",
            build: wrapped_with_note,
            expected_digest: "",
        },
        GoldenVector {
            name: "Alice with elided subject",
            build: subject_elided,
            expected_digest: "",
        },
        GoldenVector {
            name: "Alice with encrypted subject",
            build: subject_encrypted,
            expected_digest: "",
        },
    ]
}

/// Verify all golden vectors produce the expected digests.
///
/// Returns `(name, matches, digest_hex)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let hex = (v.build)().digest().to_hex();
            let matches = v.expected_digest.is_empty() || hex == v.expected_digest;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}

#[derive(Serialize)]
struct VectorRecord {
    name: String,
    digest: String,
    envelope_bytes: String,
}

/// All vectors with their derived outputs as pretty JSON.
pub fn vectors_json() -> serde_json::Result<String> {
    let records: Vec<VectorRecord> = all_vectors()
        .iter()
        .map(|v| {
            let envelope = (v.build)();
            VectorRecord {
                name: v.name.to_string(),
                digest: envelope.digest().to_hex(),
                envelope_bytes: hex::encode(envelope.to_cbor_data()),
            }
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let e1 = (vector.build)();
            let e2 = (vector.build)();
            assert_eq!(
                e1.to_cbor_data(),
                e2.to_cbor_data(),
                "Vector '{}' produced different bytes on regeneration",
                vector.name
            );
        }
    }

    #[test]
    fn test_obscured_vectors_share_digest() {
        let plain = alice_knows_bob().digest();
        assert_eq!(subject_elided().digest(), plain);
        assert_eq!(subject_encrypted().digest(), plain);
    }

    #[test]
    fn test_verify_all_vectors() {
        for (name, matches, _) in verify_all_vectors() {
            assert!(matches, "vector '{}' digest mismatch", name);
        }
    }

    #[test]
    fn test_vectors_json_parses() {
        let json = vectors_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), all_vectors().len());
    }
}
