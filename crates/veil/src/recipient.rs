//! Public-key encryption to one or more recipients.
//!
//! The subject is encrypted under a fresh content key, and the content key
//! is sealed to each recipient in a `'hasRecipient': SealedMessage`
//! assertion. Each seal is bound to the subject's digest.

use veil_core::{known_value, CoreError, SealedMessage, SymmetricKey, X25519PublicKey, X25519StaticSecret};

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// Seal `content_key` to `recipient` and attach it.
    pub fn add_recipient(
        &self,
        recipient: &X25519PublicKey,
        content_key: &SymmetricKey,
    ) -> Result<Envelope> {
        let context = self.subject().digest();
        let sealed = SealedMessage::seal(content_key, recipient, context.as_bytes())?;
        Ok(self.add_assertion(known_value::HAS_RECIPIENT, sealed))
    }

    /// Encrypt the subject under a fresh key and seal it to every recipient.
    pub fn encrypt_subject_to_recipients(
        &self,
        recipients: &[X25519PublicKey],
    ) -> Result<Envelope> {
        let content_key = SymmetricKey::generate();
        recipients.iter().try_fold(
            self.encrypt_subject(&content_key)?,
            |envelope, recipient| envelope.add_recipient(recipient, &content_key),
        )
    }

    pub fn encrypt_subject_to_recipient(&self, recipient: &X25519PublicKey) -> Result<Envelope> {
        self.encrypt_subject_to_recipients(std::slice::from_ref(recipient))
    }

    /// Sealed content keys attached to this envelope.
    pub fn recipients(&self) -> Result<Vec<SealedMessage>> {
        self.objects_for_predicate(known_value::HAS_RECIPIENT)
            .iter()
            .filter(|object| !object.is_obscured())
            .map(|object| object.extract_sealed_message())
            .collect()
    }

    /// Find the seal `secret` opens and decrypt the subject with it.
    pub fn decrypt_subject_to_recipient(&self, secret: &X25519StaticSecret) -> Result<Envelope> {
        for sealed in self.recipients()? {
            match sealed.open(secret) {
                Ok(content_key) => return self.decrypt_subject(&content_key),
                Err(CoreError::AuthenticationFailed) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        tracing::debug!("no recipient entry opened");
        Err(EnvelopeError::NoMatchingRecipient)
    }
}
