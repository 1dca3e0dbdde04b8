//! Inclusion proofs.
//!
//! A proof is the envelope elided down to the paths that reach the target
//! digests, with the targets themselves elided too. It has the same root
//! digest as the original, so a holder of only the root digest can confirm
//! the targets are in the tree without seeing anything else.

use std::collections::HashSet;

use veil_core::Digest;

use crate::envelope::{DigestProvider, Envelope};

impl Envelope {
    /// A proof that every digest in `target` occurs in this envelope, or
    /// `None` if one does not.
    pub fn proof_contains_set(&self, target: &HashSet<Digest>) -> Option<Envelope> {
        if !target.is_subset(&self.deep_digests()) {
            return None;
        }
        Some(self.elide_revealing_set(target).elide_removing_set(target))
    }

    pub fn proof_contains_target(&self, target: &impl DigestProvider) -> Option<Envelope> {
        self.proof_contains_set(&HashSet::from([target.digest()]))
    }

    /// True if `proof` shares this envelope's digest and reaches every
    /// digest in `target`.
    pub fn confirm_contains_set(&self, target: &HashSet<Digest>, proof: &Envelope) -> bool {
        self.digest() == proof.digest() && target.is_subset(&proof.deep_digests())
    }

    pub fn confirm_contains_target(&self, target: &impl DigestProvider, proof: &Envelope) -> bool {
        self.confirm_contains_set(&HashSet::from([target.digest()]), proof)
    }
}
