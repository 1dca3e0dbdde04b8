//! Predicate-object pairs.

use std::fmt;

use veil_core::{Digest, DigestKind};

use crate::encodable::EnvelopeEncodable;
use crate::envelope::Envelope;

/// A single `predicate: object` statement about a subject.
///
/// The digest is fixed at construction from the digests of both sides.
#[derive(Clone)]
pub struct Assertion {
    predicate: Envelope,
    object: Envelope,
    digest: Digest,
}

impl Assertion {
    pub fn new(predicate: impl EnvelopeEncodable, object: impl EnvelopeEncodable) -> Self {
        let predicate = predicate.into_envelope();
        let object = object.into_envelope();
        let digest =
            Digest::for_children(DigestKind::Assertion, [&predicate.digest(), &object.digest()]);
        Self {
            predicate,
            object,
            digest,
        }
    }

    pub fn predicate(&self) -> &Envelope {
        &self.predicate
    }

    pub fn object(&self) -> &Envelope {
        &self.object
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }
}

impl PartialEq for Assertion {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for Assertion {}

impl fmt::Debug for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assertion")
            .field("predicate", &self.predicate)
            .field("object", &self.object)
            .finish()
    }
}
