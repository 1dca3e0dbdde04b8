//! Conversions into envelopes and extraction back out.

use ciborium::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use veil_core::{Digest, KnownValue, PublicKey, Salt, SealedMessage, Signature};

use crate::assertion::Assertion;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

/// Types that can become an envelope.
pub trait EnvelopeEncodable {
    fn into_envelope(self) -> Envelope;
}

impl EnvelopeEncodable for Envelope {
    fn into_envelope(self) -> Envelope {
        self
    }
}

impl EnvelopeEncodable for &Envelope {
    fn into_envelope(self) -> Envelope {
        self.clone()
    }
}

impl EnvelopeEncodable for Assertion {
    fn into_envelope(self) -> Envelope {
        Envelope::from_case(EnvelopeCase::Assertion(self))
    }
}

impl EnvelopeEncodable for KnownValue {
    fn into_envelope(self) -> Envelope {
        Envelope::new_known_value(self)
    }
}

impl EnvelopeEncodable for Value {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(self)
    }
}

macro_rules! leaf_from_integer {
    ($($t:ty),*) => {
        $(
            impl EnvelopeEncodable for $t {
                fn into_envelope(self) -> Envelope {
                    Envelope::new_leaf(Value::Integer(self.into()))
                }
            }
        )*
    };
}

leaf_from_integer!(u8, u16, u32, u64, i8, i16, i32, i64);

impl EnvelopeEncodable for bool {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(Value::Bool(self))
    }
}

impl EnvelopeEncodable for f64 {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(Value::Float(self))
    }
}

impl EnvelopeEncodable for &str {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(Value::Text(self.to_string()))
    }
}

impl EnvelopeEncodable for String {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(Value::Text(self))
    }
}

impl EnvelopeEncodable for &String {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(Value::Text(self.clone()))
    }
}

impl EnvelopeEncodable for &[u8] {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(Value::Bytes(self.to_vec()))
    }
}

impl EnvelopeEncodable for Vec<u8> {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(Value::Bytes(self))
    }
}

impl EnvelopeEncodable for Digest {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(self.to_cbor_value())
    }
}

impl EnvelopeEncodable for Salt {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(self.to_cbor_value())
    }
}

impl EnvelopeEncodable for Signature {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(self.to_cbor_value())
    }
}

impl EnvelopeEncodable for PublicKey {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(self.to_cbor_value())
    }
}

impl EnvelopeEncodable for SealedMessage {
    fn into_envelope(self) -> Envelope {
        Envelope::new_leaf(self.to_cbor_value())
    }
}

impl Envelope {
    /// A leaf holding the serde image of `value`.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Envelope> {
        let value =
            Value::serialized(value).map_err(|e| EnvelopeError::Extraction(e.to_string()))?;
        Ok(Envelope::new_leaf(value))
    }

    /// The subject's leaf value, if the subject is a leaf.
    pub fn leaf_value(&self) -> Result<&Value> {
        match self.subject_case() {
            EnvelopeCase::Leaf { value, .. } => Ok(value),
            _ => Err(EnvelopeError::NotLeaf),
        }
    }

    /// Deserialize the subject's leaf value.
    pub fn extract_subject<T: DeserializeOwned>(&self) -> Result<T> {
        self.leaf_value()?
            .deserialized()
            .map_err(|e| EnvelopeError::Extraction(e.to_string()))
    }

    /// Deserialize the single object for `predicate`.
    pub fn extract_object_for_predicate<T: DeserializeOwned>(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<T> {
        self.object_for_predicate(predicate)?.extract_subject()
    }

    /// Deserialize every object for `predicate`.
    pub fn extract_objects_for_predicate<T: DeserializeOwned>(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<Vec<T>> {
        self.objects_for_predicate(predicate)
            .iter()
            .map(|object| object.extract_subject())
            .collect()
    }

    pub fn extract_digest(&self) -> Result<Digest> {
        Ok(Digest::from_cbor_value(self.leaf_value()?)?)
    }

    pub fn extract_salt(&self) -> Result<Salt> {
        Ok(Salt::from_cbor_value(self.leaf_value()?)?)
    }

    pub fn extract_signature(&self) -> Result<Signature> {
        Ok(Signature::from_cbor_value(self.leaf_value()?)?)
    }

    pub fn extract_public_key(&self) -> Result<PublicKey> {
        Ok(PublicKey::from_cbor_value(self.leaf_value()?)?)
    }

    pub fn extract_sealed_message(&self) -> Result<SealedMessage> {
        Ok(SealedMessage::from_cbor_value(self.leaf_value()?)?)
    }

    fn subject_case(&self) -> &EnvelopeCase {
        match self.case() {
            EnvelopeCase::Node { subject, .. } => subject.case(),
            case => case,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_extract_primitives() {
        assert_eq!(Envelope::new(42u32).extract_subject::<u64>().unwrap(), 42);
        assert_eq!(Envelope::new("hi").extract_subject::<String>().unwrap(), "hi");
        assert!(Envelope::new(true).extract_subject::<bool>().unwrap());
    }

    #[test]
    fn test_extract_wrong_type() {
        let err = Envelope::new("hi").extract_subject::<u64>().unwrap_err();
        assert!(matches!(err, EnvelopeError::Extraction(_)));
    }

    #[test]
    fn test_extract_from_non_leaf() {
        let err = Envelope::new("x").wrap().extract_subject::<String>().unwrap_err();
        assert!(matches!(err, EnvelopeError::NotLeaf));
    }

    #[test]
    fn test_serializable_round_trip() {
        let person = Person {
            name: "Alice".into(),
            age: 30,
        };
        let envelope = Envelope::from_serializable(&person).unwrap();
        assert_eq!(envelope.extract_subject::<Person>().unwrap(), person);
    }

    #[test]
    fn test_integer_widths_share_digest() {
        assert_eq!(Envelope::new(30u8).digest(), Envelope::new(30i64).digest());
        assert_ne!(Envelope::new(30).digest(), Envelope::new("30").digest());
    }

    #[test]
    fn test_extract_typed_leaves() {
        let salt = Salt::from_bytes(vec![1u8; 8]).unwrap();
        assert_eq!(Envelope::new(salt.clone()).extract_salt().unwrap(), salt);
        let digest = Envelope::new("x").digest();
        assert_eq!(Envelope::new(digest).extract_digest().unwrap(), digest);
        assert!(Envelope::new("x").extract_digest().is_err());
    }
}
