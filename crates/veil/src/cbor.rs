//! Wire format.
//!
//! ## Encoding
//!
//! ```text
//! envelope   = 200(untagged)
//! untagged   = leaf / node / wrapped / assertion / elided / known / encrypted / compressed
//! leaf       = 24(value)
//! node       = [subject, + assertion]          assertions sorted by digest
//! wrapped    = 200(untagged)
//! assertion  = { predicate: object }
//! elided     = bytes(32)
//! known      = 40000(uint)
//! encrypted  = 40002([ciphertext, nonce, aad])
//! compressed = 40003([data, uncompressed_size, digest])
//! ```
//!
//! All bytes are deterministic CBOR. Decoding is strict by default: input that
//! does not re-encode to the same bytes is rejected.

use ciborium::value::Value;

use veil_core::canonical::{canonical_bytes, decode_value, decode_value_relaxed};
use veil_core::{tags, CompressedData, Digest, EncryptedMessage, KnownValue};

use crate::assertion::Assertion;
use crate::config::EnvelopeConfig;
use crate::encodable::EnvelopeEncodable;
use crate::envelope::{check_assertion_position, Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// The envelope as an untagged CBOR value.
    pub fn untagged_cbor(&self) -> Value {
        match self.case() {
            EnvelopeCase::Leaf { value, .. } => Value::Tag(tags::LEAF, Box::new(value.clone())),
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                let mut items = Vec::with_capacity(assertions.len() + 1);
                items.push(subject.untagged_cbor());
                items.extend(assertions.iter().map(|a| a.untagged_cbor()));
                Value::Array(items)
            }
            EnvelopeCase::Wrapped { envelope, .. } => envelope.tagged_cbor(),
            EnvelopeCase::Assertion(assertion) => Value::Map(vec![(
                assertion.predicate().untagged_cbor(),
                assertion.object().untagged_cbor(),
            )]),
            EnvelopeCase::Elided(digest) => Value::Bytes(digest.as_bytes().to_vec()),
            EnvelopeCase::Encrypted { message, .. } => message.to_cbor_value(),
            EnvelopeCase::Compressed(compressed) => compressed.to_cbor_value(),
            EnvelopeCase::KnownValue { value, .. } => value.to_cbor_value(),
        }
    }

    /// The envelope as a tagged CBOR value.
    pub fn tagged_cbor(&self) -> Value {
        Value::Tag(tags::ENVELOPE, Box::new(self.untagged_cbor()))
    }

    /// Canonical serialized bytes.
    pub fn to_cbor_data(&self) -> Vec<u8> {
        canonical_bytes(&self.tagged_cbor())
    }

    /// Decode with the default configuration.
    pub fn from_cbor_data(bytes: &[u8]) -> Result<Envelope> {
        Self::from_cbor_data_with(bytes, &EnvelopeConfig::default())
    }

    pub fn from_cbor_data_with(bytes: &[u8], config: &EnvelopeConfig) -> Result<Envelope> {
        let value = if config.require_canonical {
            decode_value(bytes)?
        } else {
            decode_value_relaxed(bytes)?
        };
        let envelope = Self::from_tagged_cbor(&value)?;

        if config.require_canonical && envelope.to_cbor_data() != bytes {
            return Err(EnvelopeError::NonCanonical(
                "assertions are unsorted or duplicated".into(),
            ));
        }
        Ok(envelope)
    }

    pub fn from_tagged_cbor(value: &Value) -> Result<Envelope> {
        match value {
            Value::Tag(tags::ENVELOPE, inner) => Self::from_untagged_cbor(inner),
            _ => Err(EnvelopeError::InvalidFormat("expected envelope tag".into())),
        }
    }

    pub fn from_untagged_cbor(value: &Value) -> Result<Envelope> {
        match value {
            Value::Tag(tags::LEAF, inner) => Ok(Envelope::new_leaf(inner.as_ref().clone())),
            Value::Tag(tags::ENVELOPE, inner) => Ok(Self::from_untagged_cbor(inner)?.wrap()),
            Value::Tag(tags::KNOWN_VALUE, _) => {
                Ok(Envelope::new_known_value(KnownValue::from_cbor_value(value)?))
            }
            Value::Tag(tags::ENCRYPTED, _) => {
                Envelope::new_encrypted(EncryptedMessage::from_cbor_value(value)?)
            }
            Value::Tag(tags::COMPRESSED, _) => {
                Ok(Envelope::new_compressed(CompressedData::from_cbor_value(value)?))
            }
            Value::Tag(tag, _) => Err(EnvelopeError::InvalidFormat(format!(
                "unexpected tag {tag}"
            ))),
            Value::Bytes(bytes) => Ok(Envelope::new_elided(Digest::try_from(bytes.as_slice())?)),
            Value::Map(entries) => match entries.as_slice() {
                [(predicate, object)] => Ok(Assertion::new(
                    Self::from_untagged_cbor(predicate)?,
                    Self::from_untagged_cbor(object)?,
                )
                .into_envelope()),
                _ => Err(EnvelopeError::InvalidFormat(
                    "assertion must have exactly one entry".into(),
                )),
            },
            Value::Array(items) if items.len() >= 2 => {
                // A nested node or bare assertion subject is kept as is; only
                // the construction APIs flatten or wrap it.
                let subject = Self::from_untagged_cbor(&items[0])?;
                let assertions = items[1..]
                    .iter()
                    .map(Self::from_untagged_cbor)
                    .collect::<Result<Vec<_>>>()?;
                for assertion in &assertions {
                    check_assertion_position(assertion)?;
                }
                Ok(Envelope::new_node_unchecked(subject, assertions))
            }
            Value::Array(_) => Err(EnvelopeError::InvalidFormat(
                "node must have a subject and at least one assertion".into(),
            )),
            _ => Err(EnvelopeError::InvalidFormat("unrecognized envelope case".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::known_value;

    fn sample() -> Envelope {
        Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion(known_value::NOTE, 30)
            .wrap()
            .add_assertion("signed", true)
    }

    #[test]
    fn test_round_trip_preserves_digest_and_bytes() {
        let e = sample();
        let bytes = e.to_cbor_data();
        let decoded = Envelope::from_cbor_data(&bytes).unwrap();
        assert_eq!(decoded.digest(), e.digest());
        assert_eq!(decoded.to_cbor_data(), bytes);
    }

    #[test]
    fn test_round_trip_obscured() {
        let e = sample();
        let target = e.try_unwrap().unwrap().assertions()[0].digest();
        let elided = e.elide_removing_target(&target);
        let decoded = Envelope::from_cbor_data(&elided.to_cbor_data()).unwrap();
        assert!(decoded.is_identical_to(&elided));
    }

    #[test]
    fn test_leaf_encoding() {
        let bytes = Envelope::new(1u8).to_cbor_data();
        // 200(24(1))
        assert_eq!(bytes, vec![0xd8, 0xc8, 0xd8, 0x18, 0x01]);
    }

    #[test]
    fn test_unsorted_assertions_rejected() {
        let e = Envelope::new("Alice")
            .add_assertion("knows", "Bob")
            .add_assertion("age", 30);
        let mut items = match e.untagged_cbor() {
            Value::Array(items) => items,
            _ => panic!("expected array"),
        };
        items[1..].reverse();
        let bytes = canonical_bytes(&Value::Tag(tags::ENVELOPE, Box::new(Value::Array(items))));

        assert!(matches!(
            Envelope::from_cbor_data(&bytes),
            Err(EnvelopeError::NonCanonical(_))
        ));

        let relaxed = EnvelopeConfig {
            require_canonical: false,
            ..EnvelopeConfig::default()
        };
        let decoded = Envelope::from_cbor_data_with(&bytes, &relaxed).unwrap();
        assert_eq!(decoded.digest(), e.digest());
    }

    #[test]
    fn test_leaf_in_assertion_position_rejected() {
        let bad = Value::Tag(
            tags::ENVELOPE,
            Box::new(Value::Array(vec![
                Envelope::new("Alice").untagged_cbor(),
                Envelope::new("Bob").untagged_cbor(),
            ])),
        );
        assert!(matches!(
            Envelope::from_tagged_cbor(&bad),
            Err(EnvelopeError::InvalidAssertion)
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(Envelope::from_cbor_data(&[0xff]).is_err());
        assert!(matches!(
            Envelope::from_tagged_cbor(&Value::Integer(1.into())),
            Err(EnvelopeError::InvalidFormat(_))
        ));
        assert!(matches!(
            Envelope::from_untagged_cbor(&Value::Bytes(vec![0; 31])),
            Err(EnvelopeError::Core(_))
        ));
        assert!(matches!(
            Envelope::from_untagged_cbor(&Value::Tag(99, Box::new(Value::Null))),
            Err(EnvelopeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_nested_node_subject_round_trip() {
        let inner = Envelope::new("Alice").add_assertion("knows", "Bob");
        let outer = inner
            .elide()
            .add_assertion("note", "outer")
            .walk_unelide(&[inner.clone()]);
        assert!(outer.subject().is_node());

        let bytes = outer.to_cbor_data();
        let decoded = Envelope::from_cbor_data(&bytes).unwrap();
        assert!(decoded.is_identical_to(&outer));
        assert!(decoded.subject().is_node());
        assert_eq!(decoded.to_cbor_data(), bytes);
    }

    #[test]
    fn test_assertion_subject_round_trip() {
        let assertion = Envelope::new_assertion("knows", "Bob");
        let outer = assertion
            .elide()
            .add_assertion("note", "outer")
            .walk_unelide(&[assertion]);
        assert!(outer.subject().is_assertion());

        let decoded = Envelope::from_cbor_data(&outer.to_cbor_data()).unwrap();
        assert!(decoded.is_identical_to(&outer));
    }

    #[test]
    fn test_known_value_round_trip() {
        let e = Envelope::new(known_value::IS_A);
        let decoded = Envelope::from_cbor_data(&e.to_cbor_data()).unwrap();
        assert_eq!(decoded.as_known_value(), Some(&known_value::IS_A));
    }
}
