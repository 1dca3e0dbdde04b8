//! Authenticated encryption and key agreement.
//!
//! ChaCha20-Poly1305 with associated data for obscuring envelope nodes, and
//! X25519 key agreement for sealing content keys to recipients.

use bytes::Bytes;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305,
};
use ciborium::value::Value;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use x25519_dalek::{EphemeralSecret, PublicKey as DalekPublicKey, StaticSecret};

use crate::digest::Digest;
use crate::error::{CoreError, Result};
use crate::tags;

/// A 256-bit symmetric key for ChaCha20-Poly1305.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<EncryptedMessage> {
        self.encrypt_with_nonce(plaintext, aad, Nonce::generate())
    }

    /// Encrypt with a caller-chosen nonce.
    ///
    /// Reusing a nonce under the same key destroys confidentiality; this
    /// exists for reproducible test vectors.
    pub fn encrypt_with_nonce(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        nonce: Nonce,
    ) -> Result<EncryptedMessage> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        let ciphertext = cipher
            .encrypt(
                chacha20poly1305::Nonce::from_slice(&nonce.0),
                Payload { msg: plaintext, aad },
            )
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        Ok(EncryptedMessage {
            ciphertext: Bytes::from(ciphertext),
            nonce,
            aad: Bytes::copy_from_slice(aad),
        })
    }

    /// Decrypt and authenticate a message produced by this key.
    pub fn decrypt(&self, message: &EncryptedMessage) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|_| CoreError::AuthenticationFailed)?;

        cipher
            .decrypt(
                chacha20poly1305::Nonce::from_slice(&message.nonce.0),
                Payload {
                    msg: &message.ciphertext,
                    aad: &message.aad,
                },
            )
            .map_err(|_| CoreError::AuthenticationFailed)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce(pub [u8; 12]);

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// Ciphertext (with Poly1305 tag appended), nonce and associated data.
///
/// When an envelope node is encrypted the associated data is the node's
/// digest, so the ciphertext cannot be moved to another position in a tree
/// without failing authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    ciphertext: Bytes,
    nonce: Nonce,
    aad: Bytes,
}

impl EncryptedMessage {
    /// Reassemble a message from its parts.
    pub fn from_parts(ciphertext: impl Into<Bytes>, nonce: Nonce, aad: impl Into<Bytes>) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            nonce,
            aad: aad.into(),
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn aad(&self) -> &[u8] {
        &self.aad
    }

    /// The associated data interpreted as a digest, if it is one.
    pub fn aad_digest(&self) -> Option<Digest> {
        Digest::try_from(self.aad.as_ref()).ok()
    }

    /// Size of the ciphertext including the authentication tag.
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }

    /// Tagged CBOR form: `40002([ciphertext, nonce, aad])`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(
            tags::ENCRYPTED,
            Box::new(Value::Array(vec![
                Value::Bytes(self.ciphertext.to_vec()),
                Value::Bytes(self.nonce.0.to_vec()),
                Value::Bytes(self.aad.to_vec()),
            ])),
        )
    }

    /// Parse the tagged CBOR form.
    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        let items = match value {
            Value::Tag(tags::ENCRYPTED, inner) => match inner.as_ref() {
                Value::Array(items) if items.len() == 3 => items,
                _ => return Err(CoreError::Malformed("encrypted message must be a 3-array".into())),
            },
            _ => return Err(CoreError::Malformed("expected tagged encrypted message".into())),
        };

        let ciphertext = expect_bytes(&items[0], "ciphertext")?;
        let nonce_bytes = expect_bytes(&items[1], "nonce")?;
        let aad = expect_bytes(&items[2], "aad")?;

        let nonce: [u8; 12] = nonce_bytes.try_into().map_err(|_| CoreError::InvalidLength {
            what: "nonce",
            expected: 12,
            actual: nonce_bytes.len(),
        })?;

        Ok(Self::from_parts(ciphertext.to_vec(), Nonce(nonce), aad.to_vec()))
    }
}

/// An X25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to x25519-dalek PublicKey.
    pub fn to_dalek(&self) -> DalekPublicKey {
        DalekPublicKey::from(self.0)
    }
}

impl From<DalekPublicKey> for X25519PublicKey {
    fn from(pk: DalekPublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

/// An X25519 static secret key.
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(StaticSecret::from(bytes))
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(DalekPublicKey::from(&self.0))
    }

    /// Perform key agreement with a peer's public key.
    pub fn diffie_hellman(&self, peer_public: &X25519PublicKey) -> SharedKey {
        let shared = self.0.diffie_hellman(&peer_public.to_dalek());
        SharedKey(*shared.as_bytes())
    }
}

/// A shared secret derived from X25519 key agreement.
#[derive(Clone)]
pub struct SharedKey([u8; 32]);

impl SharedKey {
    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a wrapping key from this shared secret, bound to `context`.
    pub fn derive_wrapping_key(&self, context: &[u8]) -> SymmetricKey {
        let mut hasher = blake3::Hasher::new_derive_key("veil-recipient-v0-wrapping");
        hasher.update(&self.0);
        hasher.update(context);
        SymmetricKey(*hasher.finalize().as_bytes())
    }
}

/// Ephemeral key pair for one-time key agreement.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: X25519PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a new ephemeral key pair.
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(rand::thread_rng());
        let public = X25519PublicKey::from(DalekPublicKey::from(&secret));
        Self { secret, public }
    }

    /// Get the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        self.public
    }

    /// Perform key agreement with a peer's public key.
    ///
    /// Consumes the ephemeral secret (can only be used once).
    pub fn diffie_hellman(self, peer_public: &X25519PublicKey) -> SharedKey {
        let shared = self.secret.diffie_hellman(&peer_public.to_dalek());
        SharedKey(*shared.as_bytes())
    }
}

/// A content key sealed to one recipient.
///
/// The sender runs X25519 between a fresh ephemeral key and the recipient's
/// public key, derives a wrapping key bound to `context`, and encrypts the
/// content key with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    ephemeral_public: X25519PublicKey,
    message: EncryptedMessage,
}

impl SealedMessage {
    /// Seal `content_key` so only the holder of `recipient`'s secret can open it.
    pub fn seal(
        content_key: &SymmetricKey,
        recipient: &X25519PublicKey,
        context: &[u8],
    ) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key();

        let wrap_key = ephemeral.diffie_hellman(recipient).derive_wrapping_key(context);
        let message = wrap_key.encrypt(content_key.as_bytes(), context)?;

        Ok(Self {
            ephemeral_public,
            message,
        })
    }

    /// Recover the content key with the recipient's secret.
    pub fn open(&self, recipient_secret: &X25519StaticSecret) -> Result<SymmetricKey> {
        let wrap_key = recipient_secret
            .diffie_hellman(&self.ephemeral_public)
            .derive_wrapping_key(self.message.aad());
        let key_bytes = wrap_key.decrypt(&self.message)?;

        let arr: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| CoreError::InvalidLength {
            what: "content key",
            expected: 32,
            actual: key_bytes.len(),
        })?;
        Ok(SymmetricKey::from_bytes(arr))
    }

    pub fn ephemeral_public(&self) -> &X25519PublicKey {
        &self.ephemeral_public
    }

    /// Tagged CBOR form: `40019([ephemeral_public, encrypted])`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(
            tags::SEALED_MESSAGE,
            Box::new(Value::Array(vec![
                Value::Bytes(self.ephemeral_public.0.to_vec()),
                self.message.to_cbor_value(),
            ])),
        )
    }

    /// Parse the tagged CBOR form.
    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        let items = match value {
            Value::Tag(tags::SEALED_MESSAGE, inner) => match inner.as_ref() {
                Value::Array(items) if items.len() == 2 => items,
                _ => return Err(CoreError::Malformed("sealed message must be a 2-array".into())),
            },
            _ => return Err(CoreError::Malformed("expected tagged sealed message".into())),
        };

        let public_bytes = expect_bytes(&items[0], "ephemeral public key")?;
        let public: [u8; 32] = public_bytes.try_into().map_err(|_| CoreError::InvalidLength {
            what: "ephemeral public key",
            expected: 32,
            actual: public_bytes.len(),
        })?;

        Ok(Self {
            ephemeral_public: X25519PublicKey(public),
            message: EncryptedMessage::from_cbor_value(&items[1])?,
        })
    }
}

fn expect_bytes<'a>(value: &'a Value, what: &str) -> Result<&'a [u8]> {
    match value {
        Value::Bytes(b) => Ok(b),
        _ => Err(CoreError::Malformed(format!("{what} is not a byte string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::generate();
        let message = key.encrypt(b"hello, world!", b"aad").unwrap();
        assert_ne!(message.ciphertext(), b"hello, world!");

        let decrypted = key.decrypt(&message).unwrap();
        assert_eq!(decrypted, b"hello, world!");
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();

        let message = key1.encrypt(b"secret", b"").unwrap();
        assert!(matches!(key2.decrypt(&message), Err(CoreError::AuthenticationFailed)));
    }

    #[test]
    fn test_aad_is_authenticated() {
        let key = SymmetricKey::generate();
        let message = key.encrypt(b"secret", &[0x11; 32]).unwrap();

        let moved = EncryptedMessage::from_parts(
            message.ciphertext().to_vec(),
            *message.nonce(),
            vec![0x22; 32],
        );
        assert!(matches!(key.decrypt(&moved), Err(CoreError::AuthenticationFailed)));
        assert_eq!(message.aad_digest(), Some(Digest::from_bytes([0x11; 32])));
    }

    #[test]
    fn test_fixed_nonce_is_deterministic() {
        let key = SymmetricKey::from_bytes([7; 32]);
        let nonce = Nonce::from_bytes([9; 12]);
        let a = key.encrypt_with_nonce(b"data", b"", nonce).unwrap();
        let b = key.encrypt_with_nonce(b"data", b"", nonce).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encrypted_message_cbor() {
        let key = SymmetricKey::generate();
        let message = key.encrypt(b"payload", &[0x33; 32]).unwrap();
        let parsed = EncryptedMessage::from_cbor_value(&message.to_cbor_value()).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_x25519_key_agreement() {
        let alice_secret = X25519StaticSecret::generate();
        let bob_secret = X25519StaticSecret::generate();

        let alice_shared = alice_secret.diffie_hellman(&bob_secret.public_key());
        let bob_shared = bob_secret.diffie_hellman(&alice_secret.public_key());

        assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
    }

    #[test]
    fn test_sealed_message_roundtrip() {
        let recipient = X25519StaticSecret::generate();
        let content_key = SymmetricKey::generate();

        let sealed = SealedMessage::seal(&content_key, &recipient.public_key(), b"ctx").unwrap();
        let opened = sealed.open(&recipient).unwrap();
        assert_eq!(opened, content_key);

        let reparsed = SealedMessage::from_cbor_value(&sealed.to_cbor_value()).unwrap();
        assert_eq!(reparsed.open(&recipient).unwrap(), content_key);
    }

    #[test]
    fn test_sealed_message_wrong_recipient_fails() {
        let recipient = X25519StaticSecret::generate();
        let stranger = X25519StaticSecret::generate();
        let sealed =
            SealedMessage::seal(&SymmetricKey::generate(), &recipient.public_key(), b"ctx").unwrap();

        assert!(matches!(sealed.open(&stranger), Err(CoreError::AuthenticationFailed)));
    }

    #[test]
    fn test_wrapping_key_context_separation() {
        let shared = SharedKey([0x42; 32]);
        let k1 = shared.derive_wrapping_key(b"context-a");
        let k2 = shared.derive_wrapping_key(b"context-a");
        let k3 = shared.derive_wrapping_key(b"context-b");
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
    }
}
