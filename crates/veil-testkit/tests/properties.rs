//! Property tests over generated envelopes.

use std::collections::HashSet;

use proptest::prelude::*;
use veil::{Envelope, ObscureAction};
use veil_testkit::generators::{assertion_pairs, envelope, envelope_with_targets, leaf, symmetric_key};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_elide_preserves_digest((e, targets) in envelope_with_targets()) {
        prop_assert_eq!(e.elide_removing_set(&targets).digest(), e.digest());
        prop_assert_eq!(e.elide_revealing_set(&targets).digest(), e.digest());
    }

    #[test]
    fn prop_encrypt_and_compress_preserve_digest(
        (e, targets) in envelope_with_targets(),
        key in symmetric_key(),
    ) {
        let encrypted = e
            .elide_removing_set_with_action(&targets, &ObscureAction::Encrypt(key))
            .unwrap();
        prop_assert_eq!(encrypted.digest(), e.digest());

        let compressed = e
            .elide_removing_set_with_action(&targets, &ObscureAction::Compress)
            .unwrap();
        prop_assert_eq!(compressed.digest(), e.digest());
    }

    #[test]
    fn prop_encrypt_round_trip(e in envelope(), key in symmetric_key()) {
        let decrypted = e.encrypt(&key).unwrap().decrypt(&key).unwrap();
        prop_assert!(decrypted.is_identical_to(&e));
    }

    #[test]
    fn prop_compress_round_trip(e in envelope()) {
        let decompressed = e.compress().unwrap().decompress().unwrap();
        prop_assert!(decompressed.is_identical_to(&e));
    }

    #[test]
    fn prop_walk_decrypt_restores((e, targets) in envelope_with_targets(), key in symmetric_key()) {
        let encrypted = e
            .elide_removing_set_with_action(&targets, &ObscureAction::Encrypt(key.clone()))
            .unwrap();
        let restored = encrypted.walk_decrypt(&[key]).unwrap();
        prop_assert!(restored.is_identical_to(&e));
    }

    #[test]
    fn prop_elision_is_idempotent((e, targets) in envelope_with_targets()) {
        let once = e.elide_removing_set(&targets);
        prop_assert!(once.elide_removing_set(&targets).is_identical_to(&once));

        let revealed = e.elide_revealing_set(&targets);
        prop_assert!(revealed.elide_revealing_set(&targets).is_identical_to(&revealed));
    }

    #[test]
    fn prop_insertion_order_is_irrelevant(subject in leaf(), pairs in assertion_pairs()) {
        let forward = pairs
            .iter()
            .fold(subject.clone(), |e, (p, o)| e.add_assertion(p, o));
        let reverse = pairs
            .iter()
            .rev()
            .fold(subject, |e, (p, o)| e.add_assertion(p, o));
        prop_assert_eq!(forward.digest(), reverse.digest());
        prop_assert_eq!(forward.to_cbor_data(), reverse.to_cbor_data());
    }

    #[test]
    fn prop_reveal_remove_duality((e, targets) in envelope_with_targets()) {
        let reveal = e.reveal_set_of(&targets);
        let complement: HashSet<_> = e.deep_digests().difference(&reveal).copied().collect();

        let revealed = e.elide_revealing_set(&reveal);
        let removed = e.elide_removing_set(&complement);
        prop_assert!(revealed.is_identical_to(&removed));

        let visible = revealed.deep_digests();
        prop_assert!(targets.is_subset(&visible));
    }

    #[test]
    fn prop_reveal_closes_over_ancestors((e, targets) in envelope_with_targets()) {
        let revealed = e.elide_revealing_set(&targets);
        let closed = e.elide_revealing_set(&e.reveal_set_of(&targets));
        prop_assert!(revealed.is_identical_to(&closed));
        prop_assert!(targets.is_subset(&revealed.deep_digests()));
    }

    #[test]
    fn prop_wire_round_trip(e in envelope()) {
        let decoded = Envelope::from_cbor_data(&e.to_cbor_data()).unwrap();
        prop_assert!(decoded.is_identical_to(&e));
    }
}
