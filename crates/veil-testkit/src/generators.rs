//! Proptest generators for property-based testing.

use std::collections::HashSet;

use ciborium::value::Value;
use proptest::prelude::*;

use veil::Envelope;
use veil_core::{Digest, SymmetricKey};

/// Generate a CBOR value suitable for a leaf.
pub fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|i| Value::Integer(i.into())),
        "[a-zA-Z ]{0,24}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        any::<bool>().prop_map(Value::Bool),
    ]
}

/// Generate a leaf or known-value envelope.
pub fn leaf() -> impl Strategy<Value = Envelope> {
    prop_oneof![
        4 => leaf_value().prop_map(Envelope::new_leaf),
        1 => (1u64..20).prop_map(Envelope::new_known_value),
    ]
}

/// Generate an arbitrary envelope tree of bounded depth.
pub fn envelope() -> impl Strategy<Value = Envelope> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            1 => inner.clone().prop_map(|e| e.wrap()),
            3 => (
                inner.clone(),
                prop::collection::vec((inner.clone(), inner), 1..4),
            )
                .prop_map(|(subject, assertions)| {
                    assertions
                        .into_iter()
                        .fold(subject, |e, (p, o)| e.add_assertion(p, o))
                }),
        ]
    })
}

/// Generate an envelope together with a subset of its node digests.
pub fn envelope_with_targets() -> impl Strategy<Value = (Envelope, HashSet<Digest>)> {
    envelope()
        .prop_flat_map(|e| {
            let mut digests: Vec<Digest> = e.deep_digests().into_iter().collect();
            digests.sort();
            let len = digests.len();
            (Just(e), prop::sample::subsequence(digests, 0..=len))
        })
        .prop_map(|(e, targets)| (e, targets.into_iter().collect()))
}

/// Generate assertion pairs for building a node in several orders.
pub fn assertion_pairs() -> impl Strategy<Value = Vec<(Envelope, Envelope)>> {
    prop::collection::vec((leaf(), leaf()), 1..8)
}

/// Generate a symmetric key.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    any::<[u8; 32]>().prop_map(SymmetricKey::from_bytes)
}
