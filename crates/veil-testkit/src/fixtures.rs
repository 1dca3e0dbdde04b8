//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use rand::rngs::StdRng;
use rand::SeedableRng;

use veil::{known_value, Envelope};
use veil_core::{Keypair, SymmetricKey, X25519StaticSecret};

/// The canonical sample: `"Alice"` with `knows: "Bob"` and `age: 30`.
pub fn alice_knows_bob() -> Envelope {
    Envelope::new("Alice")
        .add_assertion("knows", "Bob")
        .add_assertion("age", 30)
}

/// Keys for one party: a signer, a content key and a recipient secret.
pub struct EnvelopeFixture {
    pub issuer: Keypair,
    pub content_key: SymmetricKey,
    pub recipient: X25519StaticSecret,
    seed: Option<[u8; 32]>,
}

impl EnvelopeFixture {
    /// Create a new test fixture with random keys.
    pub fn new() -> Self {
        Self {
            issuer: Keypair::generate(),
            content_key: SymmetricKey::generate(),
            recipient: X25519StaticSecret::generate(),
            seed: None,
        }
    }

    /// Create with deterministic keys from a seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let mut content = seed;
        content[31] ^= 0x01;
        let mut recipient = seed;
        recipient[31] ^= 0x02;
        Self {
            issuer: Keypair::from_seed(&seed),
            content_key: SymmetricKey::from_bytes(content),
            recipient: X25519StaticSecret::from_bytes(recipient),
            seed: Some(seed),
        }
    }

    /// A salted credential about Alice, signed by the issuer.
    ///
    /// Seeded fixtures produce the same salt every time.
    pub fn signed_credential(&self) -> Envelope {
        let body = alice_knows_bob()
            .add_assertion(known_value::ISSUER, "Example Registry")
            .add_assertion(known_value::IS_A, "Credential");
        let salted = match self.seed {
            Some(seed) => body.add_salt_using(&mut StdRng::from_seed(seed)),
            None => body.add_salt(),
        };
        salted.sign(&self.issuer)
    }

    /// A message whose subject is readable only by this fixture's recipient.
    pub fn sealed_message(&self, text: &str) -> Envelope {
        Envelope::new(text)
            .add_assertion("from", "Alice")
            .encrypt_subject_to_recipient(&self.recipient.public_key())
            .expect("sealing to a valid key succeeds")
    }
}

impl Default for EnvelopeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<EnvelopeFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            EnvelopeFixture::with_seed(seed)
        })
        .collect()
}
