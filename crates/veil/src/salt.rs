//! Salting: decorrelating digests of low-entropy content.
//!
//! A salt is an assertion `'salt': Salt(bytes)`. Adding one changes the
//! node's digest, so an elided "age: 30" can no longer be confirmed by
//! hashing guesses.

use rand::RngCore;

use veil_core::{known_value, Salt};

use crate::envelope::Envelope;
use crate::error::Result;

impl Envelope {
    /// Add a salt sized in proportion to this envelope's serialized length.
    pub fn add_salt(&self) -> Envelope {
        let size = self.to_cbor_data().len();
        self.add_salt_instance(Salt::for_size(size))
    }

    /// Add a salt drawn from `rng`.
    pub fn add_salt_using(&self, rng: &mut impl RngCore) -> Envelope {
        let size = self.to_cbor_data().len();
        self.add_salt_instance(Salt::for_size_using(size, rng))
    }

    /// Add a salt of exactly `len` bytes.
    pub fn add_salt_with_len(&self, len: usize) -> Result<Envelope> {
        Ok(self.add_salt_instance(Salt::generate(len)?))
    }

    pub fn add_salt_instance(&self, salt: Salt) -> Envelope {
        self.add_assertion(known_value::SALT, salt)
    }

    /// Salts attached directly to this envelope.
    pub fn salts(&self) -> Result<Vec<Salt>> {
        self.objects_for_predicate(known_value::SALT)
            .iter()
            .map(|object| object.extract_salt())
            .collect()
    }
}
