//! Digest: the content address of every envelope node.
//!
//! A digest is Blake3 over a fixed domain prefix, a one-byte node-kind
//! discriminator, and the node's semantic image. Composite nodes hash the
//! digests of their children, never the children's bytes, so an obscured
//! child contributes exactly what its plaintext would.

use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::tags;

/// Domain prefix mixed into every node digest.
const DIGEST_DOMAIN: &[u8; 16] = b"veil-envelope-v0";

/// Node-kind discriminator for digest computation.
///
/// Obscured variants (elided, encrypted, compressed) have no discriminator:
/// they carry the digest of the node they stand in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DigestKind {
    Leaf = 1,
    Node = 2,
    Wrapped = 3,
    Assertion = 4,
    KnownValue = 8,
}

impl DigestKind {
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// A 32-byte Blake3 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Plain Blake3 of the given data, without domain separation.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Digest of a node image under the envelope domain.
    pub fn for_image(kind: DigestKind, image: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DIGEST_DOMAIN);
        hasher.update(&[kind.to_u8()]);
        hasher.update(image);
        Self(*hasher.finalize().as_bytes())
    }

    /// Digest of a composite node from its children's digests, in order.
    pub fn for_children<'a>(kind: DigestKind, children: impl IntoIterator<Item = &'a Digest>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DIGEST_DOMAIN);
        hasher.update(&[kind.to_u8()]);
        for child in children {
            hasher.update(&child.0);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First four bytes as hex, for compact display.
    pub fn short_description(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Check that `image` hashes to this digest under `kind`.
    pub fn validate(&self, kind: DigestKind, image: &[u8]) -> bool {
        Self::for_image(kind, image) == *self
    }

    /// Tagged CBOR form: `40001(bytes)`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(tags::DIGEST, Box::new(Value::Bytes(self.0.to_vec())))
    }

    /// Parse the tagged CBOR form.
    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        match value {
            Value::Tag(tags::DIGEST, inner) => match inner.as_ref() {
                Value::Bytes(b) => Self::try_from(b.as_slice()),
                _ => Err(CoreError::Malformed("digest payload is not bytes".into())),
            },
            _ => Err(CoreError::Malformed("expected tagged digest".into())),
        }
    }

    /// The zero digest (sentinel).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            what: "digest",
            expected: 32,
            actual: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_hex_roundtrip() {
        let d = Digest::from_bytes([0x42; 32]);
        assert_eq!(Digest::from_hex(&d.to_hex()).unwrap(), d);
    }

    #[test]
    fn test_digest_debug() {
        let d = Digest::from_bytes([0xcd; 32]);
        assert_eq!(format!("{:?}", d), "Digest(cdcdcdcdcdcdcdcd)");
        assert_eq!(d.short_description(), "cdcdcdcd");
    }

    #[test]
    fn test_kind_separates_digests() {
        let image = b"same bytes";
        let leaf = Digest::for_image(DigestKind::Leaf, image);
        let known = Digest::for_image(DigestKind::KnownValue, image);
        assert_ne!(leaf, known);
        assert!(leaf.validate(DigestKind::Leaf, image));
        assert!(!leaf.validate(DigestKind::Leaf, b"other bytes"));
    }

    #[test]
    fn test_children_order_matters() {
        let a = Digest::hash(b"a");
        let b = Digest::hash(b"b");
        let ab = Digest::for_children(DigestKind::Assertion, [&a, &b]);
        let ba = Digest::for_children(DigestKind::Assertion, [&b, &a]);
        assert_ne!(ab, ba);

        let wrapped = Digest::for_children(DigestKind::Wrapped, [&a]);
        let node = Digest::for_children(DigestKind::Node, [&a]);
        assert_ne!(wrapped, node);
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let low = Digest::from_bytes([0x00; 32]);
        let mut high_bytes = [0x00; 32];
        high_bytes[0] = 0x01;
        let high = Digest::from_bytes(high_bytes);
        assert!(low < high);
    }

    #[test]
    fn test_cbor_value_roundtrip() {
        let d = Digest::hash(b"payload");
        let value = d.to_cbor_value();
        assert_eq!(Digest::from_cbor_value(&value).unwrap(), d);
        assert!(Digest::from_cbor_value(&Value::Bytes(vec![1, 2, 3])).is_err());
    }

    #[test]
    fn test_try_from_wrong_length() {
        let err = Digest::try_from(&[0u8; 31][..]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLength { expected: 32, actual: 31, .. }));
    }
}
