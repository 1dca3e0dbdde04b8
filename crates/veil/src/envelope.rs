//! The envelope tree.
//!
//! An [`Envelope`] is an immutable, reference-counted node. Every node has a
//! digest that depends only on its semantic content, so a subtree can be
//! elided, encrypted or compressed without changing the digest of anything
//! above it.
//!
//! ## Structure
//!
//! ```text
//! Node { subject, assertions: [Assertion | obscured, ...] }   sorted by digest
//!   subject:   Leaf | Wrapped | KnownValue | obscured
//!   Assertion: { predicate: Envelope, object: Envelope }
//! ```
//!
//! Clones share structure. Transformations rebuild only the path from the
//! root to whatever changed.

use ciborium::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use veil_core::{
    canonical_bytes, CompressedData, Digest, DigestKind, EncryptedMessage, KnownValue,
};

use crate::assertion::Assertion;
use crate::encodable::EnvelopeEncodable;
use crate::error::{EnvelopeError, Result};

/// Lazily computed, memoized digest of a composite node.
///
/// Two threads may race to fill the cell; both compute the same value and
/// the loser's copy is discarded.
#[derive(Default)]
pub struct DigestCell(OnceLock<Digest>);

impl DigestCell {
    pub(crate) fn new() -> Self {
        Self(OnceLock::new())
    }

    /// The digest, if it has been computed.
    pub fn get(&self) -> Option<Digest> {
        self.0.get().copied()
    }

    fn get_or_compute(&self, compute: impl FnOnce() -> Digest) -> Digest {
        if let Some(digest) = self.0.get() {
            return *digest;
        }
        let digest = compute();
        if self.0.set(digest).is_err() {
            tracing::trace!(digest = %digest.short_description(), "digest memoized concurrently");
        }
        digest
    }
}

impl fmt::Debug for DigestCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(digest) => write!(f, "DigestCell({})", digest.short_description()),
            None => write!(f, "DigestCell(pending)"),
        }
    }
}

/// The variants an envelope node can take.
#[derive(Debug)]
pub enum EnvelopeCase {
    /// An opaque CBOR value.
    Leaf { value: Value, digest: DigestCell },

    /// A subject with one or more assertions, sorted by digest.
    Node {
        subject: Envelope,
        assertions: Vec<Envelope>,
        digest: DigestCell,
    },

    /// An envelope treated as an opaque subject.
    Wrapped { envelope: Envelope, digest: DigestCell },

    /// A predicate-object pair.
    Assertion(Assertion),

    /// Content removed, digest retained.
    Elided(Digest),

    /// Content encrypted under a symmetric key, digest carried as associated data.
    Encrypted { message: EncryptedMessage, digest: Digest },

    /// Content compressed, digest retained.
    Compressed(CompressedData),

    /// A compact enumerated value.
    KnownValue { value: KnownValue, digest: DigestCell },
}

/// A node of the envelope tree.
#[derive(Clone)]
pub struct Envelope(Arc<EnvelopeCase>);

/// Anything that can name a node by digest.
pub trait DigestProvider {
    fn digest(&self) -> Digest;
}

impl DigestProvider for Digest {
    fn digest(&self) -> Digest {
        *self
    }
}

impl DigestProvider for Envelope {
    fn digest(&self) -> Digest {
        Envelope::digest(self)
    }
}

impl DigestProvider for Assertion {
    fn digest(&self) -> Digest {
        Assertion::digest(self)
    }
}

impl<T: DigestProvider + ?Sized> DigestProvider for &T {
    fn digest(&self) -> Digest {
        (**self).digest()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Construction
// ════════════════════════════════════════════════════════════════════════════

impl Envelope {
    pub(crate) fn from_case(case: EnvelopeCase) -> Self {
        Self(Arc::new(case))
    }

    /// An envelope whose subject is `subject`.
    pub fn new(subject: impl EnvelopeEncodable) -> Self {
        subject.into_envelope()
    }

    pub fn new_leaf(value: Value) -> Self {
        Self::from_case(EnvelopeCase::Leaf {
            value,
            digest: DigestCell::new(),
        })
    }

    pub fn new_known_value(value: impl Into<KnownValue>) -> Self {
        Self::from_case(EnvelopeCase::KnownValue {
            value: value.into(),
            digest: DigestCell::new(),
        })
    }

    pub fn new_assertion(
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Self {
        Assertion::new(predicate, object).into_envelope()
    }

    /// A placeholder for content that has been removed.
    pub fn new_elided(digest: Digest) -> Self {
        Self::from_case(EnvelopeCase::Elided(digest))
    }

    /// An encrypted node from its parts.
    ///
    /// The associated data must be exactly the 32 digest bytes of the
    /// plaintext envelope.
    pub fn new_encrypted(message: EncryptedMessage) -> Result<Self> {
        let digest = message.aad_digest().ok_or_else(|| {
            EnvelopeError::InvalidFormat("encrypted associated data is not a digest".into())
        })?;
        Ok(Self::from_case(EnvelopeCase::Encrypted { message, digest }))
    }

    pub fn new_compressed(compressed: CompressedData) -> Self {
        Self::from_case(EnvelopeCase::Compressed(compressed))
    }

    /// A node carrying `assertions` about `subject`.
    ///
    /// A node subject is flattened into the result, a bare assertion subject
    /// is wrapped first, and duplicate assertions collapse. Every assertion
    /// must be an assertion or an obscured envelope. With no assertions the
    /// subject itself is returned.
    pub fn new_node(
        subject: Envelope,
        assertions: impl IntoIterator<Item = Envelope>,
    ) -> Result<Self> {
        let (subject, mut merged) = match subject.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => (subject.clone(), assertions.clone()),
            EnvelopeCase::Assertion(_) => (subject.wrap(), Vec::new()),
            _ => (subject, Vec::new()),
        };
        for assertion in assertions {
            check_assertion_position(&assertion)?;
            merged.push(assertion);
        }
        Ok(Self::new_node_unchecked(subject, merged))
    }

    /// Assemble a node without validating or flattening.
    ///
    /// Callers guarantee the subject is not a node or bare assertion and that
    /// every assertion is valid in assertion position.
    pub(crate) fn new_node_unchecked(subject: Envelope, mut assertions: Vec<Envelope>) -> Self {
        assertions.sort_by_key(|a| a.digest());
        assertions.dedup_by_key(|a| a.digest());
        if assertions.is_empty() {
            return subject;
        }
        Self::from_case(EnvelopeCase::Node {
            subject,
            assertions,
            digest: DigestCell::new(),
        })
    }

    /// Wrap this envelope so it can be the subject of new assertions.
    pub fn wrap(&self) -> Envelope {
        Self::from_case(EnvelopeCase::Wrapped {
            envelope: self.clone(),
            digest: DigestCell::new(),
        })
    }

    /// The envelope inside a wrapped subject.
    pub fn try_unwrap(&self) -> Result<Envelope> {
        match self.subject().case() {
            EnvelopeCase::Wrapped { envelope, .. } => Ok(envelope.clone()),
            _ => Err(EnvelopeError::NotWrapped),
        }
    }
}

pub(crate) fn check_assertion_position(envelope: &Envelope) -> Result<()> {
    if envelope.is_assertion() || envelope.is_obscured() {
        Ok(())
    } else {
        Err(EnvelopeError::InvalidAssertion)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Identity
// ════════════════════════════════════════════════════════════════════════════

impl Envelope {
    pub fn case(&self) -> &EnvelopeCase {
        &self.0
    }

    /// The semantic digest of this node.
    ///
    /// Composite digests are computed on first access and memoized.
    pub fn digest(&self) -> Digest {
        match self.case() {
            EnvelopeCase::Leaf { value, digest } => digest.get_or_compute(|| {
                Digest::for_image(DigestKind::Leaf, &canonical_bytes(value))
            }),
            EnvelopeCase::Node {
                subject,
                assertions,
                digest,
            } => digest.get_or_compute(|| {
                let mut children = Vec::with_capacity(assertions.len() + 1);
                children.push(subject.digest());
                children.extend(assertions.iter().map(|a| a.digest()));
                Digest::for_children(DigestKind::Node, &children)
            }),
            EnvelopeCase::Wrapped { envelope, digest } => digest.get_or_compute(|| {
                Digest::for_children(DigestKind::Wrapped, [&envelope.digest()])
            }),
            EnvelopeCase::Assertion(assertion) => assertion.digest(),
            EnvelopeCase::Elided(digest) => *digest,
            EnvelopeCase::Encrypted { digest, .. } => *digest,
            EnvelopeCase::Compressed(compressed) => compressed.digest(),
            EnvelopeCase::KnownValue { value, digest } => digest.get_or_compute(|| value.digest()),
        }
    }

    /// Digest of the exact serialized form.
    ///
    /// Unlike [`digest`](Self::digest) this changes when any part of the
    /// tree is obscured.
    pub fn structural_digest(&self) -> Digest {
        Digest::hash(&self.to_cbor_data())
    }

    /// Same semantic content, however it is currently obscured.
    pub fn is_equivalent_to(&self, other: &Envelope) -> bool {
        self.digest() == other.digest()
    }

    /// Same semantic content and the same obscuring.
    pub fn is_identical_to(&self, other: &Envelope) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.is_equivalent_to(other) && self.structural_digest() == other.structural_digest()
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Envelope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent_to(other)
    }
}

impl Eq for Envelope {}

impl Hash for Envelope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest().hash(state);
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.case() {
            EnvelopeCase::Leaf { value, .. } => write!(f, "Leaf({:?})", value),
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => f
                .debug_struct("Node")
                .field("subject", subject)
                .field("assertions", assertions)
                .finish(),
            EnvelopeCase::Wrapped { envelope, .. } => {
                f.debug_tuple("Wrapped").field(envelope).finish()
            }
            EnvelopeCase::Assertion(assertion) => write!(f, "{:?}", assertion),
            EnvelopeCase::Elided(digest) => write!(f, "Elided({})", digest.short_description()),
            EnvelopeCase::Encrypted { digest, .. } => {
                write!(f, "Encrypted({})", digest.short_description())
            }
            EnvelopeCase::Compressed(compressed) => {
                write!(f, "Compressed({})", compressed.digest().short_description())
            }
            EnvelopeCase::KnownValue { value, .. } => write!(f, "{}", value),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Assertions
// ════════════════════════════════════════════════════════════════════════════

impl Envelope {
    /// Add `predicate: object`. Adding an assertion already present is a no-op.
    pub fn add_assertion(
        &self,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Envelope {
        self.add_assertion_unchecked(Envelope::new_assertion(predicate, object))
    }

    /// Add an assertion envelope, which may also be obscured.
    pub fn add_assertion_envelope(&self, assertion: impl EnvelopeEncodable) -> Result<Envelope> {
        let assertion = assertion.into_envelope();
        check_assertion_position(&assertion)?;
        Ok(self.add_assertion_unchecked(assertion))
    }

    pub fn add_assertion_envelopes(&self, assertions: &[Envelope]) -> Result<Envelope> {
        assertions
            .iter()
            .try_fold(self.clone(), |envelope, assertion| {
                envelope.add_assertion_envelope(assertion)
            })
    }

    /// Add the assertion only when `object` is present.
    pub fn add_optional_assertion(
        &self,
        predicate: impl EnvelopeEncodable,
        object: Option<impl EnvelopeEncodable>,
    ) -> Envelope {
        match object {
            Some(object) => self.add_assertion(predicate, object),
            None => self.clone(),
        }
    }

    pub fn add_assertion_if(
        &self,
        condition: bool,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
    ) -> Envelope {
        if condition {
            self.add_assertion(predicate, object)
        } else {
            self.clone()
        }
    }

    /// Add an assertion whose object carries a random salt, so the
    /// assertion's digest cannot be guessed from its content.
    pub fn add_assertion_salted(
        &self,
        predicate: impl EnvelopeEncodable,
        object: impl EnvelopeEncodable,
        salted: bool,
    ) -> Envelope {
        let object = object.into_envelope();
        let object = if salted { object.add_salt() } else { object };
        self.add_assertion(predicate, object)
    }

    fn add_assertion_unchecked(&self, assertion: Envelope) -> Envelope {
        let (subject, mut assertions) = match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                if assertions.iter().any(|a| a.digest() == assertion.digest()) {
                    return self.clone();
                }
                (subject.clone(), assertions.clone())
            }
            EnvelopeCase::Assertion(_) => (self.wrap(), Vec::new()),
            _ => (self.clone(), Vec::new()),
        };
        assertions.push(assertion);
        Self::new_node_unchecked(subject, assertions)
    }

    /// Remove the assertion with the given digest. Missing targets are a no-op.
    pub fn remove_assertion(&self, target: impl DigestProvider) -> Envelope {
        let target = target.digest();
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                if !assertions.iter().any(|a| a.digest() == target) {
                    return self.clone();
                }
                let remaining = assertions
                    .iter()
                    .filter(|a| a.digest() != target)
                    .cloned()
                    .collect();
                Self::new_node_unchecked(subject.clone(), remaining)
            }
            _ => self.clone(),
        }
    }

    /// Swap one assertion for another.
    pub fn replace_assertion(
        &self,
        target: impl DigestProvider,
        replacement: Envelope,
    ) -> Result<Envelope> {
        self.remove_assertion(target)
            .add_assertion_envelope(replacement)
    }

    /// Keep the assertions, change the subject.
    pub fn replace_subject(&self, subject: Envelope) -> Result<Envelope> {
        Envelope::new_node(subject, self.assertions().iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::known_value;

    fn alice() -> Envelope {
        Envelope::new("Alice")
    }

    #[test]
    fn test_leaf_digest_is_stable() {
        assert_eq!(alice().digest(), alice().digest());
        assert_ne!(alice().digest(), Envelope::new("Bob").digest());
    }

    #[test]
    fn test_digest_memoized() {
        let node = alice().add_assertion("knows", "Bob");
        if let EnvelopeCase::Node { digest, .. } = node.case() {
            assert!(digest.get().is_none());
            let d = node.digest();
            assert_eq!(digest.get(), Some(d));
        } else {
            panic!("expected node");
        }
    }

    #[test]
    fn test_assertion_order_does_not_matter() {
        let a = alice().add_assertion("knows", "Bob").add_assertion("age", 30);
        let b = alice().add_assertion("age", 30).add_assertion("knows", "Bob");
        assert_eq!(a.digest(), b.digest());
        assert!(a.is_identical_to(&b));
    }

    #[test]
    fn test_duplicate_assertion_is_noop() {
        let once = alice().add_assertion("knows", "Bob");
        let twice = once.add_assertion("knows", "Bob");
        assert_eq!(twice.assertions().len(), 1);
        assert!(once.ptr_eq(&twice));
    }

    #[test]
    fn test_new_node_flattens_and_dedups() {
        let base = alice().add_assertion("knows", "Bob");
        let extra = Envelope::new_assertion("age", 30);
        let node = Envelope::new_node(base.clone(), [extra.clone(), extra]).unwrap();
        assert_eq!(node.assertions().len(), 2);
        assert!(node.subject().is_leaf());
        assert_eq!(node.digest(), base.add_assertion("age", 30).digest());
    }

    #[test]
    fn test_new_node_without_assertions_is_subject() {
        let node = Envelope::new_node(alice(), []).unwrap();
        assert!(node.ptr_eq(&node.subject()));
        assert_eq!(node.digest(), alice().digest());
    }

    #[test]
    fn test_non_assertion_in_assertion_position_rejected() {
        let err = Envelope::new_node(alice(), [Envelope::new("Bob")]).unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidAssertion));
        assert!(matches!(
            alice().add_assertion_envelope(Envelope::new(42)),
            Err(EnvelopeError::InvalidAssertion)
        ));
    }

    #[test]
    fn test_elided_assertion_accepted() {
        let assertion = Envelope::new_assertion("knows", "Bob");
        let node = alice().add_assertion_envelope(assertion.elide()).unwrap();
        assert_eq!(node.digest(), alice().add_assertion("knows", "Bob").digest());
    }

    #[test]
    fn test_assertion_on_assertion_wraps_receiver() {
        let assertion = Envelope::new_assertion("knows", "Bob");
        let node = assertion.add_assertion(known_value::NOTE, "met at work");
        assert!(node.subject().is_wrapped());
        assert_eq!(node.try_unwrap().unwrap().digest(), assertion.digest());
    }

    #[test]
    fn test_wrap_unwrap() {
        let node = alice().add_assertion("knows", "Bob");
        let wrapped = node.wrap();
        assert_ne!(wrapped.digest(), node.digest());
        assert_eq!(wrapped.try_unwrap().unwrap().digest(), node.digest());
        assert!(matches!(alice().try_unwrap(), Err(EnvelopeError::NotWrapped)));
    }

    #[test]
    fn test_wrapped_subject_unwraps_through_assertions() {
        let signed = alice().wrap().add_assertion(known_value::NOTE, "hi");
        assert_eq!(signed.try_unwrap().unwrap().digest(), alice().digest());
    }

    #[test]
    fn test_remove_and_replace_assertion() {
        let knows = Envelope::new_assertion("knows", "Bob");
        let node = alice().add_assertion_envelope(&knows).unwrap();
        let removed = node.remove_assertion(&knows);
        assert_eq!(removed.digest(), alice().digest());
        assert!(removed.remove_assertion(&knows).ptr_eq(&removed));

        let replaced = node
            .replace_assertion(&knows, Envelope::new_assertion("knows", "Carol"))
            .unwrap();
        assert_eq!(replaced.digest(), alice().add_assertion("knows", "Carol").digest());
    }

    #[test]
    fn test_replace_subject() {
        let node = alice().add_assertion("knows", "Bob");
        let carol = node.replace_subject(Envelope::new("Carol")).unwrap();
        assert_eq!(carol.digest(), Envelope::new("Carol").add_assertion("knows", "Bob").digest());
    }

    #[test]
    fn test_optional_and_conditional_assertions() {
        let none: Option<&str> = None;
        assert_eq!(alice().add_optional_assertion("knows", none).digest(), alice().digest());
        assert_eq!(
            alice().add_optional_assertion("knows", Some("Bob")).digest(),
            alice().add_assertion("knows", "Bob").digest()
        );
        assert_eq!(alice().add_assertion_if(false, "knows", "Bob").digest(), alice().digest());
    }

    #[test]
    fn test_salted_assertion_hides_content() {
        let plain = alice().add_assertion("age", 30);
        let salted = alice().add_assertion_salted("age", 30, true);
        assert_ne!(plain.digest(), salted.digest());
        assert_eq!(
            alice().add_assertion_salted("age", 30, false).digest(),
            plain.digest()
        );
    }

    #[test]
    fn test_new_encrypted_requires_digest_aad() {
        let key = veil_core::SymmetricKey::from_bytes([7; 32]);
        let message = key.encrypt(b"x", b"short").unwrap();
        assert!(matches!(
            Envelope::new_encrypted(message),
            Err(EnvelopeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_debug_is_compact() {
        let text = format!("{:?}", alice().add_assertion("knows", "Bob").elide());
        assert!(text.starts_with("Elided("));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_add_then_remove_restores_subject(
                subject in "[a-z]{1,12}",
                predicate in "[a-z]{1,12}",
                object in any::<i64>(),
            ) {
                let base = Envelope::new(subject.as_str());
                let assertion = Envelope::new_assertion(predicate.as_str(), object);
                let extended = base.add_assertion_envelope(assertion.clone()).unwrap();
                prop_assert_ne!(extended.digest(), base.digest());
                prop_assert_eq!(extended.remove_assertion(&assertion).digest(), base.digest());
            }

            #[test]
            fn test_duplicate_assertions_collapse(predicate in "[a-z]{1,12}", object in any::<u32>()) {
                let once = Envelope::new("s").add_assertion(predicate.as_str(), object);
                let twice = once.add_assertion(predicate.as_str(), object);
                prop_assert_eq!(once.assertions().len(), 1);
                prop_assert!(twice.is_identical_to(&once));
            }
        }
    }
}
