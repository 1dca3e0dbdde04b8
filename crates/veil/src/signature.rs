//! Signatures over subject digests.
//!
//! A signature is an assertion `'verifiedBy': Signature` whose message is
//! the subject's digest. Since obscuring preserves digests, a signature
//! stays valid while the signed content is elided or encrypted.

use veil_core::{known_value, Keypair, PublicKey, Signature};

use crate::envelope::Envelope;
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// Sign the subject as it stands and attach the signature.
    pub fn add_signature(&self, signer: &Keypair) -> Envelope {
        let digest = self.subject().digest();
        self.add_assertion(known_value::VERIFIED_BY, signer.sign(digest.as_bytes()))
    }

    /// Wrap the whole envelope and sign the wrapper, covering every assertion.
    pub fn sign(&self, signer: &Keypair) -> Envelope {
        self.wrap().add_signature(signer)
    }

    /// Signatures attached directly to this envelope.
    ///
    /// Obscured signature objects are skipped.
    pub fn signatures(&self) -> Result<Vec<Signature>> {
        self.objects_for_predicate(known_value::VERIFIED_BY)
            .iter()
            .filter(|object| !object.is_obscured())
            .map(|object| object.extract_signature())
            .collect()
    }

    pub fn has_signature_from(&self, public_key: &PublicKey) -> Result<bool> {
        let digest = self.subject().digest();
        Ok(self
            .signatures()?
            .iter()
            .any(|signature| public_key.verify(digest.as_bytes(), signature).is_ok()))
    }

    /// This envelope, if it carries a valid signature from `public_key`.
    pub fn verify_signature_from(&self, public_key: &PublicKey) -> Result<Envelope> {
        if self.has_signature_from(public_key)? {
            Ok(self.clone())
        } else {
            tracing::warn!(key = ?public_key, "no valid signature from key");
            Err(EnvelopeError::UnverifiedSignature)
        }
    }

    /// Verify a [`sign`](Self::sign)ed envelope and return what was signed.
    pub fn verify(&self, public_key: &PublicKey) -> Result<Envelope> {
        self.verify_signature_from(public_key)?.try_unwrap()
    }
}
