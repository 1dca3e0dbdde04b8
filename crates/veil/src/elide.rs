//! Obscuring: elision, encryption and compression of selected nodes.
//!
//! Every operation here preserves the root digest. A node chosen for
//! obscuring is replaced whole; its ancestors are rebuilt around the
//! replacement and everything else is shared with the input.
//!
//! Selection is by digest and applies to every node carrying that digest, so
//! a value that occurs in several places is obscured in all of them. The
//! `_excluding` variants exempt individual occurrences, named by the digest
//! path from the root (see [`Envelope::paths_to`]).
//!
//! A reveal set is closed over ancestors before use: revealing a deep node
//! also reveals the nodes on every path from the root to it.

use std::borrow::Cow;
use std::collections::HashSet;
use std::convert::Infallible;

use veil_core::{Digest, SymmetricKey};

use crate::assertion::Assertion;
use crate::encodable::EnvelopeEncodable;
use crate::envelope::{DigestProvider, Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

/// What to do with a selected node.
#[derive(Debug, Clone)]
pub enum ObscureAction {
    /// Replace with its digest.
    Elide,
    /// Encrypt under the key, digest as associated data.
    Encrypt(SymmetricKey),
    /// Compress, digest retained.
    Compress,
}

impl ObscureAction {
    fn name(&self) -> &'static str {
        match self {
            ObscureAction::Elide => "elide",
            ObscureAction::Encrypt(_) => "encrypt",
            ObscureAction::Compress => "compress",
        }
    }
}

/// The kinds of obscured node, for [`Envelope::nodes_matching`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObscureType {
    Elided,
    Encrypted,
    Compressed,
}

/// How a target set selects nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElideMode {
    /// Obscure every node that is neither in the set nor on a path from the
    /// root to a member of it.
    Reveal,
    /// Obscure every node whose digest is in the set.
    Remove,
}

impl ElideMode {
    fn selects(self, target: &HashSet<Digest>, digest: &Digest) -> bool {
        match self {
            ElideMode::Reveal => !target.contains(digest),
            ElideMode::Remove => target.contains(digest),
        }
    }
}

impl Envelope {
    /// The digests `mode` keeps from being obscured, or obscures.
    fn selection<'a>(
        &self,
        target: &'a HashSet<Digest>,
        mode: ElideMode,
    ) -> Cow<'a, HashSet<Digest>> {
        match mode {
            ElideMode::Reveal => Cow::Owned(self.reveal_set_of(target)),
            ElideMode::Remove => Cow::Borrowed(target),
        }
    }

    /// Replace this node with its digest. Eliding an elided node is a no-op.
    pub fn elide(&self) -> Envelope {
        match self.case() {
            EnvelopeCase::Elided(_) => self.clone(),
            _ => Envelope::new_elided(self.digest()),
        }
    }

    /// Apply `action` to this node alone.
    ///
    /// Encryption and compression leave already-obscured nodes as they are;
    /// elision always yields an elided node.
    pub fn obscure(&self, action: &ObscureAction) -> Result<Envelope> {
        match action {
            ObscureAction::Elide => Ok(self.elide()),
            _ if self.is_obscured() => Ok(self.clone()),
            ObscureAction::Encrypt(key) => self.encrypt(key),
            ObscureAction::Compress => self.compress(),
        }
    }

    /// Obscure the nodes `mode` selects from `target` with `action`.
    pub fn elide_set_with_action(
        &self,
        target: &HashSet<Digest>,
        mode: ElideMode,
        action: &ObscureAction,
    ) -> Result<Envelope> {
        tracing::debug!(
            targets = target.len(),
            ?mode,
            action = action.name(),
            "obscuring envelope"
        );
        let selection = self.selection(target, mode);
        self.transform_nodes(&mut |node: &Envelope| {
            if mode.selects(&selection, &node.digest()) {
                node.obscure(action).map(Some)
            } else {
                Ok(None)
            }
        })
    }

    /// As [`Envelope::elide_set_with_action`], but occurrences whose root
    /// path is in `exclude` are left in place. Their children are still
    /// visited.
    ///
    /// Occurrences that share a digest path (a predicate equal to its
    /// object) are excluded together.
    pub fn elide_set_with_action_excluding(
        &self,
        target: &HashSet<Digest>,
        mode: ElideMode,
        action: &ObscureAction,
        exclude: &HashSet<Vec<Digest>>,
    ) -> Result<Envelope> {
        tracing::debug!(
            targets = target.len(),
            excluded = exclude.len(),
            ?mode,
            action = action.name(),
            "obscuring envelope"
        );
        let selection = self.selection(target, mode);
        let mut path = Vec::new();
        self.transform_nodes_along(&mut path, &mut |node: &Envelope, path: &[Digest]| {
            if mode.selects(&selection, &node.digest()) && !exclude.contains(path) {
                node.obscure(action).map(Some)
            } else {
                Ok(None)
            }
        })
    }

    /// Elide every occurrence of the digests in `target` except those at
    /// the paths in `exclude`.
    pub fn elide_removing_set_excluding(
        &self,
        target: &HashSet<Digest>,
        exclude: &HashSet<Vec<Digest>>,
    ) -> Envelope {
        let selection = self.selection(target, ElideMode::Remove);
        let mut path = Vec::new();
        let mut visit = |node: &Envelope, path: &[Digest]| {
            let selected =
                ElideMode::Remove.selects(&selection, &node.digest()) && !exclude.contains(path);
            Ok::<_, Infallible>(selected.then(|| node.elide()))
        };
        let result = self.transform_nodes_along(&mut path, &mut visit);
        match result {
            Ok(envelope) => envelope,
            Err(never) => match never {},
        }
    }

    /// Elide the nodes `mode` selects from `target`.
    pub fn elide_set(&self, target: &HashSet<Digest>, mode: ElideMode) -> Envelope {
        let selection = self.selection(target, mode);
        let result = self.transform_nodes(&mut |node: &Envelope| {
            Ok::<_, Infallible>(mode.selects(&selection, &node.digest()).then(|| node.elide()))
        });
        match result {
            Ok(envelope) => envelope,
            Err(never) => match never {},
        }
    }

    pub fn elide_removing_set(&self, target: &HashSet<Digest>) -> Envelope {
        self.elide_set(target, ElideMode::Remove)
    }

    pub fn elide_revealing_set(&self, target: &HashSet<Digest>) -> Envelope {
        self.elide_set(target, ElideMode::Reveal)
    }

    pub fn elide_removing_target(&self, target: &impl DigestProvider) -> Envelope {
        self.elide_removing_set(&HashSet::from([target.digest()]))
    }

    pub fn elide_revealing_target(&self, target: &impl DigestProvider) -> Envelope {
        self.elide_revealing_set(&HashSet::from([target.digest()]))
    }

    pub fn elide_removing_set_with_action(
        &self,
        target: &HashSet<Digest>,
        action: &ObscureAction,
    ) -> Result<Envelope> {
        self.elide_set_with_action(target, ElideMode::Remove, action)
    }

    pub fn elide_revealing_set_with_action(
        &self,
        target: &HashSet<Digest>,
        action: &ObscureAction,
    ) -> Result<Envelope> {
        self.elide_set_with_action(target, ElideMode::Reveal, action)
    }

    /// Restore an elided node from `envelope` if the digests agree.
    pub fn unelide(&self, envelope: &Envelope) -> Result<Envelope> {
        if self.digest() == envelope.digest() {
            Ok(envelope.clone())
        } else {
            tracing::warn!(
                expected = %self.digest().short_description(),
                actual = %envelope.digest().short_description(),
                "unelide with mismatched content"
            );
            Err(EnvelopeError::DigestMismatch {
                expected: self.digest(),
                actual: envelope.digest(),
            })
        }
    }

    /// Digests of obscured nodes of the given types.
    ///
    /// With a `target`, only nodes whose digest is in it are reported. An
    /// empty `types` slice matches every obscured type.
    pub fn nodes_matching(
        &self,
        target: Option<&HashSet<Digest>>,
        types: &[ObscureType],
    ) -> HashSet<Digest> {
        let mut result = HashSet::new();
        self.walk(false, &mut |node, _, _| {
            let kind = match node.case() {
                EnvelopeCase::Elided(_) => Some(ObscureType::Elided),
                EnvelopeCase::Encrypted { .. } => Some(ObscureType::Encrypted),
                EnvelopeCase::Compressed(_) => Some(ObscureType::Compressed),
                _ => None,
            };
            if let Some(kind) = kind {
                let type_ok = types.is_empty() || types.contains(&kind);
                let target_ok = target.map_or(true, |t| t.contains(&node.digest()));
                if type_ok && target_ok {
                    result.insert(node.digest());
                }
            }
            true
        });
        result
    }

    /// Rebuild the tree with nodes swapped by `replace`.
    ///
    /// `replace` returns `Some` to substitute a node (its children are not
    /// visited) or `None` to descend. Replacements must carry the digest of
    /// the node they stand in for.
    pub(crate) fn transform_nodes<E>(
        &self,
        replace: &mut impl FnMut(&Envelope) -> std::result::Result<Option<Envelope>, E>,
    ) -> std::result::Result<Envelope, E> {
        let mut path = Vec::new();
        self.transform_nodes_along(&mut path, &mut |node: &Envelope, _: &[Digest]| replace(node))
    }

    /// [`Envelope::transform_nodes`] with the digest path from the root to
    /// each visited node, the node itself last.
    fn transform_nodes_along<E>(
        &self,
        path: &mut Vec<Digest>,
        replace: &mut impl FnMut(&Envelope, &[Digest]) -> std::result::Result<Option<Envelope>, E>,
    ) -> std::result::Result<Envelope, E> {
        path.push(self.digest());
        let result = self.transform_children_along(path, replace);
        path.pop();
        result
    }

    fn transform_children_along<E>(
        &self,
        path: &mut Vec<Digest>,
        replace: &mut impl FnMut(&Envelope, &[Digest]) -> std::result::Result<Option<Envelope>, E>,
    ) -> std::result::Result<Envelope, E> {
        if let Some(replacement) = replace(self, path)? {
            return Ok(replacement);
        }
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                let new_subject = subject.transform_nodes_along(path, replace)?;
                let new_assertions = assertions
                    .iter()
                    .map(|a| a.transform_nodes_along(path, replace))
                    .collect::<std::result::Result<Vec<_>, E>>()?;
                let unchanged = new_subject.ptr_eq(subject)
                    && new_assertions
                        .iter()
                        .zip(assertions)
                        .all(|(new, old)| new.ptr_eq(old));
                if unchanged {
                    Ok(self.clone())
                } else {
                    Ok(Envelope::new_node_unchecked(new_subject, new_assertions))
                }
            }
            EnvelopeCase::Assertion(assertion) => {
                let predicate = assertion.predicate().transform_nodes_along(path, replace)?;
                let object = assertion.object().transform_nodes_along(path, replace)?;
                if predicate.ptr_eq(assertion.predicate()) && object.ptr_eq(assertion.object()) {
                    Ok(self.clone())
                } else {
                    Ok(Assertion::new(predicate, object).into_envelope())
                }
            }
            EnvelopeCase::Wrapped { envelope, .. } => {
                let inner = envelope.transform_nodes_along(path, replace)?;
                if inner.ptr_eq(envelope) {
                    Ok(self.clone())
                } else {
                    Ok(inner.wrap())
                }
            }
            _ => Ok(self.clone()),
        }
    }
}
