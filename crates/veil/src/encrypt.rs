//! Symmetric encryption of envelope nodes.
//!
//! The plaintext is the node's canonical serialization and the associated
//! data is its digest, so an encrypted node keeps the digest of what it
//! hides and decryption can check that it got back the same content.

use veil_core::{Digest, Nonce, SymmetricKey};

use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// Encrypt this whole node under `key`.
    pub fn encrypt(&self, key: &SymmetricKey) -> Result<Envelope> {
        self.encrypt_with_nonce(key, Nonce::generate())
    }

    /// Encrypt with a caller-supplied nonce. Only for reproducible vectors.
    pub fn encrypt_with_nonce(&self, key: &SymmetricKey, nonce: Nonce) -> Result<Envelope> {
        match self.case() {
            EnvelopeCase::Elided(_) => return Err(EnvelopeError::AlreadyElided),
            EnvelopeCase::Encrypted { .. } => return Err(EnvelopeError::AlreadyEncrypted),
            _ => {}
        }
        let digest = self.digest();
        let message = key.encrypt_with_nonce(&self.to_cbor_data(), digest.as_bytes(), nonce)?;
        Envelope::new_encrypted(message)
    }

    /// Recover the plaintext node and check it against the carried digest.
    pub fn decrypt(&self, key: &SymmetricKey) -> Result<Envelope> {
        let (message, digest) = match self.case() {
            EnvelopeCase::Encrypted { message, digest } => (message, *digest),
            _ => return Err(EnvelopeError::NotEncrypted),
        };

        let plaintext = key.decrypt(message).map_err(|e| {
            tracing::warn!(digest = %digest.short_description(), "decryption rejected");
            e
        })?;
        let envelope = Envelope::from_cbor_data(&plaintext)?;
        check_recovered_digest(digest, &envelope)?;
        Ok(envelope)
    }

    /// Encrypt only the subject, leaving assertions readable.
    pub fn encrypt_subject(&self, key: &SymmetricKey) -> Result<Envelope> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                let encrypted = subject.encrypt(key)?;
                Ok(Envelope::new_node_unchecked(encrypted, assertions.clone()))
            }
            _ => self.encrypt(key),
        }
    }

    pub fn decrypt_subject(&self, key: &SymmetricKey) -> Result<Envelope> {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                let decrypted = subject.decrypt(key)?;
                Ok(Envelope::new_node_unchecked(decrypted, assertions.clone()))
            }
            _ => self.decrypt(key),
        }
    }
}

/// Fail with [`EnvelopeError::DigestMismatch`] unless `envelope` hashes to `expected`.
pub(crate) fn check_recovered_digest(expected: Digest, envelope: &Envelope) -> Result<()> {
    let actual = envelope.digest();
    if actual == expected {
        return Ok(());
    }
    tracing::warn!(
        expected = %expected.short_description(),
        actual = %actual.short_description(),
        "recovered content does not match its digest"
    );
    Err(EnvelopeError::DigestMismatch { expected, actual })
}
