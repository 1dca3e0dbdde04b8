//! Salt: random bytes that decorrelate identical content.

use ciborium::value::Value;
use rand::{Rng, RngCore};
use std::fmt;

use crate::config::MIN_SALT_LEN;
use crate::error::{CoreError, Result};
use crate::tags;

/// Random decorrelation bytes (at least [`MIN_SALT_LEN`] long).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Generate `len` random bytes.
    pub fn generate(len: usize) -> Result<Self> {
        Self::generate_using(len, &mut rand::thread_rng())
    }

    /// Generate `len` bytes from a caller-provided RNG.
    pub fn generate_using(len: usize, rng: &mut impl RngCore) -> Result<Self> {
        if len < MIN_SALT_LEN {
            return Err(CoreError::SaltTooShort(len));
        }
        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        Ok(Self(bytes))
    }

    /// Generate a salt sized for content of `size` bytes.
    ///
    /// The length is drawn from 5%..=25% of `size`, never below
    /// [`MIN_SALT_LEN`], so small values get proportionally more noise.
    pub fn for_size(size: usize) -> Self {
        Self::for_size_using(size, &mut rand::thread_rng())
    }

    pub fn for_size_using(size: usize, rng: &mut impl RngCore) -> Self {
        let min = MIN_SALT_LEN.max(size.div_ceil(20));
        let max = (min + MIN_SALT_LEN).max(size.div_ceil(4));
        let len = rng.gen_range(min..=max);

        let mut bytes = vec![0u8; len];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < MIN_SALT_LEN {
            return Err(CoreError::SaltTooShort(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tagged CBOR form: `40018(bytes)`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(tags::SALT, Box::new(Value::Bytes(self.0.clone())))
    }

    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        match value {
            Value::Tag(tags::SALT, inner) => match inner.as_ref() {
                Value::Bytes(b) => Self::from_bytes(b.clone()),
                _ => Err(CoreError::Malformed("salt payload is not bytes".into())),
            },
            _ => Err(CoreError::Malformed("expected tagged salt".into())),
        }
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({} bytes)", self.0.len())
    }
}
