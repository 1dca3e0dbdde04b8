//! Read-only accessors over envelope structure.

use ciborium::value::Value;

use veil_core::{Digest, KnownValue};

use crate::assertion::Assertion;
use crate::encodable::EnvelopeEncodable;
use crate::envelope::{Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

impl Envelope {
    /// The subject of a node, or the envelope itself.
    pub fn subject(&self) -> Envelope {
        match self.case() {
            EnvelopeCase::Node { subject, .. } => subject.clone(),
            _ => self.clone(),
        }
    }

    /// The assertions of a node, sorted by digest. Empty for anything else.
    pub fn assertions(&self) -> &[Envelope] {
        match self.case() {
            EnvelopeCase::Node { assertions, .. } => assertions,
            _ => &[],
        }
    }

    pub fn has_assertions(&self) -> bool {
        !self.assertions().is_empty()
    }

    // ── Case tests ──────────────────────────────────────────────────────────

    pub fn is_leaf(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Leaf { .. })
    }

    pub fn is_node(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Node { .. })
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Wrapped { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Assertion(_))
    }

    pub fn is_elided(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Elided(_))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Encrypted { .. })
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.case(), EnvelopeCase::Compressed(_))
    }

    pub fn is_known_value(&self) -> bool {
        matches!(self.case(), EnvelopeCase::KnownValue { .. })
    }

    /// Elided, encrypted or compressed.
    pub fn is_obscured(&self) -> bool {
        self.is_elided() || self.is_encrypted() || self.is_compressed()
    }

    /// True for leaves, known values and obscured nodes.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.case(),
            EnvelopeCase::Node { .. } | EnvelopeCase::Wrapped { .. } | EnvelopeCase::Assertion(_)
        )
    }

    pub fn is_subject_assertion(&self) -> bool {
        self.subject().is_assertion()
    }

    pub fn is_subject_elided(&self) -> bool {
        self.subject().is_elided()
    }

    pub fn is_subject_encrypted(&self) -> bool {
        self.subject().is_encrypted()
    }

    pub fn is_subject_compressed(&self) -> bool {
        self.subject().is_compressed()
    }

    pub fn is_subject_obscured(&self) -> bool {
        self.subject().is_obscured()
    }

    // ── Case accessors ──────────────────────────────────────────────────────

    pub fn as_leaf(&self) -> Option<&Value> {
        match self.case() {
            EnvelopeCase::Leaf { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self.as_leaf() {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_byte_string(&self) -> Option<&[u8]> {
        match self.as_leaf() {
            Some(Value::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_known_value(&self) -> Option<&KnownValue> {
        match self.case() {
            EnvelopeCase::KnownValue { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_assertion(&self) -> Option<&Assertion> {
        match self.case() {
            EnvelopeCase::Assertion(assertion) => Some(assertion),
            _ => None,
        }
    }

    pub fn try_known_value(&self) -> Result<&KnownValue> {
        self.as_known_value().ok_or(EnvelopeError::NotKnownValue)
    }

    pub fn try_assertion(&self) -> Result<&Assertion> {
        self.as_assertion().ok_or(EnvelopeError::NotAssertion)
    }

    /// The predicate, if the subject is an assertion.
    pub fn as_predicate(&self) -> Option<Envelope> {
        match self.subject().case() {
            EnvelopeCase::Assertion(assertion) => Some(assertion.predicate().clone()),
            _ => None,
        }
    }

    /// The object, if the subject is an assertion.
    pub fn as_object(&self) -> Option<Envelope> {
        match self.subject().case() {
            EnvelopeCase::Assertion(assertion) => Some(assertion.object().clone()),
            _ => None,
        }
    }

    // ── Predicate lookup ────────────────────────────────────────────────────

    /// Assertions whose predicate has the digest of `predicate`.
    ///
    /// Obscured assertions never match.
    pub fn assertions_with_predicate(&self, predicate: impl EnvelopeEncodable) -> Vec<Envelope> {
        let target = predicate.into_envelope().digest();
        self.assertions()
            .iter()
            .filter(|assertion| {
                assertion
                    .as_predicate()
                    .is_some_and(|p| p.digest() == target)
            })
            .cloned()
            .collect()
    }

    /// The single assertion with `predicate`.
    pub fn assertion_with_predicate(&self, predicate: impl EnvelopeEncodable) -> Result<Envelope> {
        let mut matches = self.assertions_with_predicate(predicate);
        match matches.len() {
            0 => Err(EnvelopeError::AssertionNotFound),
            1 => Ok(matches.remove(0)),
            _ => Err(EnvelopeError::AmbiguousAssertion),
        }
    }

    /// The single assertion with `predicate`, or `None` if there is none.
    pub fn optional_assertion_with_predicate(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<Option<Envelope>> {
        match self.assertion_with_predicate(predicate) {
            Ok(assertion) => Ok(Some(assertion)),
            Err(EnvelopeError::AssertionNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The object of the single assertion with `predicate`.
    pub fn object_for_predicate(&self, predicate: impl EnvelopeEncodable) -> Result<Envelope> {
        let assertion = self.assertion_with_predicate(predicate)?;
        assertion.as_object().ok_or(EnvelopeError::NotAssertion)
    }

    pub fn optional_object_for_predicate(
        &self,
        predicate: impl EnvelopeEncodable,
    ) -> Result<Option<Envelope>> {
        Ok(self
            .optional_assertion_with_predicate(predicate)?
            .and_then(|assertion| assertion.as_object()))
    }

    pub fn objects_for_predicate(&self, predicate: impl EnvelopeEncodable) -> Vec<Envelope> {
        self.assertions_with_predicate(predicate)
            .iter()
            .filter_map(|assertion| assertion.as_object())
            .collect()
    }

    /// Number of nodes in the tree, this one included.
    pub fn elements_count(&self) -> usize {
        let mut count = 1;
        self.for_each_child(|child, _| count += child.elements_count());
        count
    }

    /// True if any node in the tree has `digest`.
    pub fn contains_digest(&self, digest: &Digest) -> bool {
        if self.digest() == *digest {
            return true;
        }
        let mut found = false;
        self.for_each_child(|child, _| found = found || child.contains_digest(digest));
        found
    }
}
