//! Known values: compact enumerated predicates.
//!
//! A known value is a small integer standing in for a frequently repeated
//! concept ("is a", "verified by", "salt"). Two known values are equal when
//! their integers are equal; the name is presentation only.

use ciborium::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::canonical::canonical_bytes;
use crate::digest::{Digest, DigestKind};
use crate::error::{CoreError, Result};
use crate::tags;

/// A compact enumerated value with an optional assigned name.
#[derive(Clone, Copy)]
pub struct KnownValue {
    value: u64,
    name: Option<&'static str>,
}

impl KnownValue {
    pub const fn new(value: u64) -> Self {
        Self { value, name: None }
    }

    pub const fn new_with_name(value: u64, name: &'static str) -> Self {
        Self {
            value,
            name: Some(name),
        }
    }

    pub const fn value(&self) -> u64 {
        self.value
    }

    pub fn assigned_name(&self) -> Option<&'static str> {
        self.name
    }

    /// The assigned name, or the integer if none.
    pub fn name(&self) -> String {
        match self.name {
            Some(name) => name.to_string(),
            None => self.value.to_string(),
        }
    }

    /// Digest over the canonical unsigned integer.
    pub fn digest(&self) -> Digest {
        Digest::for_image(DigestKind::KnownValue, &canonical_bytes(&self.untagged_value()))
    }

    pub fn untagged_value(&self) -> Value {
        Value::Integer(self.value.into())
    }

    /// Tagged CBOR form: `40000(uint)`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(tags::KNOWN_VALUE, Box::new(self.untagged_value()))
    }

    /// Parse the tagged CBOR form, attaching the registered name if any.
    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        match value {
            Value::Tag(tags::KNOWN_VALUE, inner) => match inner.as_ref() {
                Value::Integer(i) => {
                    let n: i128 = (*i).into();
                    let raw = u64::try_from(n)
                        .map_err(|_| CoreError::Malformed(format!("invalid known value: {n}")))?;
                    Ok(KnownValuesStore::global().known_value_for(raw))
                }
                _ => Err(CoreError::Malformed("known value is not an integer".into())),
            },
            _ => Err(CoreError::Malformed("expected tagged known value".into())),
        }
    }
}

impl PartialEq for KnownValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for KnownValue {}

impl std::hash::Hash for KnownValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Debug for KnownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KnownValue({})", self.name())
    }
}

impl fmt::Display for KnownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.name())
    }
}

impl From<u64> for KnownValue {
    fn from(value: u64) -> Self {
        KnownValuesStore::global().known_value_for(value)
    }
}

pub const IS_A: KnownValue = KnownValue::new_with_name(1, "isA");
pub const ID: KnownValue = KnownValue::new_with_name(2, "id");
pub const VERIFIED_BY: KnownValue = KnownValue::new_with_name(3, "verifiedBy");
pub const NOTE: KnownValue = KnownValue::new_with_name(4, "note");
pub const HAS_RECIPIENT: KnownValue = KnownValue::new_with_name(5, "hasRecipient");
pub const CONTROLLER: KnownValue = KnownValue::new_with_name(7, "controller");
pub const KEY: KnownValue = KnownValue::new_with_name(8, "key");
pub const DEREFERENCE_VIA: KnownValue = KnownValue::new_with_name(9, "dereferenceVia");
pub const ENTITY: KnownValue = KnownValue::new_with_name(10, "entity");
pub const NAME: KnownValue = KnownValue::new_with_name(11, "name");
pub const LANGUAGE: KnownValue = KnownValue::new_with_name(12, "language");
pub const ISSUER: KnownValue = KnownValue::new_with_name(13, "issuer");
pub const HOLDER: KnownValue = KnownValue::new_with_name(14, "holder");
pub const SALT: KnownValue = KnownValue::new_with_name(15, "salt");
pub const DATE: KnownValue = KnownValue::new_with_name(16, "date");
pub const UNKNOWN: KnownValue = KnownValue::new_with_name(17, "Unknown");

/// Registry of named known values.
#[derive(Debug, Clone, Default)]
pub struct KnownValuesStore {
    by_value: HashMap<u64, KnownValue>,
    by_name: HashMap<&'static str, KnownValue>,
}

impl KnownValuesStore {
    pub fn new(values: impl IntoIterator<Item = KnownValue>) -> Self {
        let mut store = Self::default();
        for value in values {
            store.insert(value);
        }
        store
    }

    /// The process-wide registry of the well-known values above.
    pub fn global() -> &'static KnownValuesStore {
        static GLOBAL: OnceLock<KnownValuesStore> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            Self::new([
                IS_A,
                ID,
                VERIFIED_BY,
                NOTE,
                HAS_RECIPIENT,
                CONTROLLER,
                KEY,
                DEREFERENCE_VIA,
                ENTITY,
                NAME,
                LANGUAGE,
                ISSUER,
                HOLDER,
                SALT,
                DATE,
                UNKNOWN,
            ])
        })
    }

    /// Register a value; a later registration replaces an earlier one.
    pub fn insert(&mut self, value: KnownValue) {
        if let Some(old) = self.by_value.insert(value.value, value) {
            if let Some(name) = old.name {
                self.by_name.remove(name);
            }
        }
        if let Some(name) = value.name {
            self.by_name.insert(name, value);
        }
    }

    /// The registered value for `raw`, or an unnamed one.
    pub fn known_value_for(&self, raw: u64) -> KnownValue {
        self.by_value
            .get(&raw)
            .copied()
            .unwrap_or(KnownValue::new(raw))
    }

    pub fn known_value_named(&self, name: &str) -> Option<KnownValue> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_name() {
        assert_eq!(KnownValue::new(1), IS_A);
        assert_eq!(KnownValue::new(1).digest(), IS_A.digest());
        assert_ne!(IS_A, ID);
    }

    #[test]
    fn test_digest_differs_from_integer_leaf_image() {
        let kv = KnownValue::new(15);
        let leaf = Digest::for_image(DigestKind::Leaf, &canonical_bytes(&kv.untagged_value()));
        assert_ne!(kv.digest(), leaf);
    }

    #[test]
    fn test_global_lookup() {
        let store = KnownValuesStore::global();
        assert_eq!(store.known_value_named("salt"), Some(SALT));
        assert_eq!(store.known_value_for(3).assigned_name(), Some("verifiedBy"));
        assert_eq!(store.known_value_for(9999).assigned_name(), None);
        assert_eq!(KnownValue::from(15).name(), "salt");
    }

    #[test]
    fn test_reinsert_replaces_name() {
        let mut store = KnownValuesStore::new([KnownValue::new_with_name(100, "old")]);
        store.insert(KnownValue::new_with_name(100, "new"));
        assert_eq!(store.len(), 1);
        assert!(store.known_value_named("old").is_none());
        assert_eq!(store.known_value_named("new"), Some(KnownValue::new(100)));
    }

    #[test]
    fn test_cbor_value_attaches_name() {
        let parsed = KnownValue::from_cbor_value(&KnownValue::new(11).to_cbor_value()).unwrap();
        assert_eq!(parsed.assigned_name(), Some("name"));
        assert_eq!(format!("{}", parsed), "'name'");
    }
}
