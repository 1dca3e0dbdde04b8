//! Ed25519 signing keys for envelope signatures.

use ciborium::value::Value;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::tags;

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
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

    /// Verify a signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;

        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }

    /// Tagged CBOR form: `40021(bytes)`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(tags::PUBLIC_KEY, Box::new(Value::Bytes(self.0.to_vec())))
    }

    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        match value {
            Value::Tag(tags::PUBLIC_KEY, inner) => match inner.as_ref() {
                Value::Bytes(b) => {
                    let arr: [u8; 32] =
                        b.as_slice().try_into().map_err(|_| CoreError::InvalidLength {
                            what: "public key",
                            expected: 32,
                            actual: b.len(),
                        })?;
                    Ok(Self(arr))
                }
                _ => Err(CoreError::Malformed("public key payload is not bytes".into())),
            },
            _ => Err(CoreError::Malformed("expected tagged public key".into())),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Tagged CBOR form: `40020(bytes)`.
    pub fn to_cbor_value(&self) -> Value {
        Value::Tag(tags::SIGNATURE, Box::new(Value::Bytes(self.0.to_vec())))
    }

    pub fn from_cbor_value(value: &Value) -> Result<Self> {
        match value {
            Value::Tag(tags::SIGNATURE, inner) => match inner.as_ref() {
                Value::Bytes(b) => {
                    let arr: [u8; 64] =
                        b.as_slice().try_into().map_err(|_| CoreError::InvalidLength {
                            what: "signature",
                            expected: 64,
                            actual: b.len(),
                        })?;
                    Ok(Self(arr))
                }
                _ => Err(CoreError::Malformed("signature payload is not bytes".into())),
            },
            _ => Err(CoreError::Malformed("expected tagged signature".into())),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8]))
    }
}

/// A keypair for signing envelopes.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.signing_key.sign(message);
        Signature(sig.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}
