//! Traversal and digest-set queries.
//!
//! Two traversal shapes:
//! - structure walk visits every node, nodes included, children one level down
//! - tree walk hides node wrappers, placing a node's subject at the node's
//!   level and its assertions one level below

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use veil_core::{Digest, SymmetricKey};

use crate::encodable::EnvelopeEncodable;
use crate::envelope::{check_assertion_position, DigestProvider, Envelope, EnvelopeCase};
use crate::error::{EnvelopeError, Result};

/// How a child hangs off its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeType {
    None,
    Subject,
    Assertion,
    Predicate,
    Object,
    Content,
}

impl EdgeType {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            EdgeType::Subject => Some("subj"),
            EdgeType::Content => Some("cont"),
            EdgeType::Predicate => Some("pred"),
            EdgeType::Object => Some("obj"),
            EdgeType::Assertion | EdgeType::None => None,
        }
    }
}

impl Envelope {
    /// Call `f` for each direct child with the edge leading to it.
    pub(crate) fn for_each_child(&self, mut f: impl FnMut(&Envelope, EdgeType)) {
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                f(subject, EdgeType::Subject);
                for assertion in assertions {
                    f(assertion, EdgeType::Assertion);
                }
            }
            EnvelopeCase::Wrapped { envelope, .. } => f(envelope, EdgeType::Content),
            EnvelopeCase::Assertion(assertion) => {
                f(assertion.predicate(), EdgeType::Predicate);
                f(assertion.object(), EdgeType::Object);
            }
            _ => {}
        }
    }

    /// Visit nodes depth-first. `visit` receives the node, its level and the
    /// incoming edge, and returns whether to descend into its children.
    pub fn walk<F>(&self, hide_nodes: bool, visit: &mut F)
    where
        F: FnMut(&Envelope, usize, EdgeType) -> bool,
    {
        if hide_nodes {
            self.walk_tree(0, EdgeType::None, visit);
        } else {
            self.walk_structure(0, EdgeType::None, visit);
        }
    }

    fn walk_structure<F>(&self, level: usize, incoming: EdgeType, visit: &mut F)
    where
        F: FnMut(&Envelope, usize, EdgeType) -> bool,
    {
        if !visit(self, level, incoming) {
            return;
        }
        self.for_each_child(|child, edge| child.walk_structure(level + 1, edge, visit));
    }

    fn walk_tree<F>(&self, level: usize, incoming: EdgeType, visit: &mut F)
    where
        F: FnMut(&Envelope, usize, EdgeType) -> bool,
    {
        if let EnvelopeCase::Node {
            subject,
            assertions,
            ..
        } = self.case()
        {
            subject.walk_tree(level, incoming, visit);
            for assertion in assertions {
                assertion.walk_tree(level + 1, EdgeType::Assertion, visit);
            }
            return;
        }
        if !visit(self, level, incoming) {
            return;
        }
        self.for_each_child(|child, edge| child.walk_tree(level + 1, edge, visit));
    }

    /// Digests of every node above `level_limit` in the structure walk.
    pub fn digests(&self, level_limit: usize) -> HashSet<Digest> {
        let mut result = HashSet::new();
        self.walk(false, &mut |node, level, _| {
            if level < level_limit {
                result.insert(node.digest());
                true
            } else {
                false
            }
        });
        result
    }

    /// Digests of every node in the tree.
    pub fn deep_digests(&self) -> HashSet<Digest> {
        self.digests(usize::MAX)
    }

    /// Digests of this node and its subject and assertions.
    pub fn shallow_digests(&self) -> HashSet<Digest> {
        self.digests(2)
    }

    /// Digests on the paths from the root to each node in `target`.
    ///
    /// Revealing this set exposes the targets and the structure needed to
    /// reach them, and nothing else.
    pub fn reveal_set_of(&self, target: &HashSet<Digest>) -> HashSet<Digest> {
        let mut result = HashSet::new();
        let mut path = Vec::new();
        self.collect_paths(target, &mut path, &mut result);
        result
    }

    /// Every digest path from the root to an occurrence of `target`, each
    /// starting with the root digest and ending with the target's.
    pub fn paths_to(&self, target: &impl DigestProvider) -> Vec<Vec<Digest>> {
        let target = target.digest();
        let mut paths = Vec::new();
        let mut path = Vec::new();
        self.collect_occurrences(&target, &mut path, &mut paths);
        paths
    }

    fn collect_occurrences(
        &self,
        target: &Digest,
        path: &mut Vec<Digest>,
        paths: &mut Vec<Vec<Digest>>,
    ) {
        let digest = self.digest();
        path.push(digest);
        if digest == *target {
            paths.push(path.clone());
        }
        self.for_each_child(|child, _| child.collect_occurrences(target, path, paths));
        path.pop();
    }

    fn collect_paths(
        &self,
        target: &HashSet<Digest>,
        path: &mut Vec<Digest>,
        result: &mut HashSet<Digest>,
    ) {
        let digest = self.digest();
        path.push(digest);
        if target.contains(&digest) {
            result.extend(path.iter().copied());
        }
        self.for_each_child(|child, _| child.collect_paths(target, path, result));
        path.pop();
    }

    /// Substitute `replacement` for every node whose digest is in `target`.
    ///
    /// Unlike the obscuring operations this changes the semantic digest.
    /// Every target must occur in the tree, and a replacement landing in an
    /// assertion slot must itself be an assertion or obscured.
    ///
    /// Substitution is literal. A node or bare assertion replacing a node's
    /// subject stays the subject as given; it is not flattened or wrapped.
    pub fn walk_replace(
        &self,
        target: &HashSet<Digest>,
        replacement: impl EnvelopeEncodable,
    ) -> Result<Envelope> {
        let replacement = replacement.into_envelope();
        let present = self.deep_digests();
        if let Some(missing) = target.iter().find(|d| !present.contains(d)) {
            return Err(EnvelopeError::TargetNotFound(*missing));
        }
        self.replace_nodes(target, &replacement)
    }

    fn replace_nodes(&self, target: &HashSet<Digest>, replacement: &Envelope) -> Result<Envelope> {
        if target.contains(&self.digest()) {
            return Ok(replacement.clone());
        }
        match self.case() {
            EnvelopeCase::Node {
                subject,
                assertions,
                ..
            } => {
                let new_subject = subject.replace_nodes(target, replacement)?;
                let new_assertions = assertions
                    .iter()
                    .map(|a| a.replace_nodes(target, replacement))
                    .collect::<Result<Vec<_>>>()?;
                for assertion in &new_assertions {
                    check_assertion_position(assertion)?;
                }
                Ok(Envelope::new_node_unchecked(new_subject, new_assertions))
            }
            EnvelopeCase::Assertion(assertion) => Ok(Envelope::new_assertion(
                assertion.predicate().replace_nodes(target, replacement)?,
                assertion.object().replace_nodes(target, replacement)?,
            )),
            EnvelopeCase::Wrapped { envelope, .. } => {
                Ok(envelope.replace_nodes(target, replacement)?.wrap())
            }
            _ => Ok(self.clone()),
        }
    }

    /// Restore elided nodes from `envelopes` wherever digests match.
    pub fn walk_unelide(&self, envelopes: &[Envelope]) -> Envelope {
        let by_digest: HashMap<Digest, &Envelope> =
            envelopes.iter().map(|e| (e.digest(), e)).collect();
        let result = self.transform_nodes(&mut |node: &Envelope| {
            Ok::<_, Infallible>(match node.case() {
                EnvelopeCase::Elided(digest) => by_digest.get(digest).map(|e| (*e).clone()),
                _ => None,
            })
        });
        match result {
            Ok(envelope) => envelope,
            Err(never) => match never {},
        }
    }

    /// Decrypt every encrypted node that one of `keys` opens.
    ///
    /// Nodes no key opens stay encrypted. Content that decrypts but does not
    /// match its digest is an error.
    pub fn walk_decrypt(&self, keys: &[SymmetricKey]) -> Result<Envelope> {
        self.transform_nodes(&mut |node: &Envelope| {
            if !node.is_encrypted() {
                return Ok(None);
            }
            for key in keys {
                match node.decrypt(key) {
                    Ok(decrypted) => return decrypted.walk_decrypt(keys).map(Some),
                    Err(e) if e.is_authentication_failure() => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(None)
        })
    }

    /// Decompress compressed nodes, all of them or those in `target`.
    pub fn walk_decompress(&self, target: Option<&HashSet<Digest>>) -> Result<Envelope> {
        self.transform_nodes(&mut |node: &Envelope| {
            let selected = node.is_compressed()
                && target.map_or(true, |t| t.contains(&node.digest()));
            if !selected {
                return Ok(None);
            }
            node.decompress()?.walk_decompress(target).map(Some)
        })
    }
}
