//! End-to-end scenarios over a small credential.
//!
//! `"Alice"` with `knows: "Bob"` and `age: 30`, built, redacted, encrypted,
//! edited and moved over the wire.

use std::collections::HashSet;

use veil::core::SymmetricKey;
use veil::{known_value, Envelope, EnvelopeError, Keypair, ObscureAction, ObscureType};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn alice() -> Envelope {
    Envelope::new("Alice")
        .add_assertion("knows", "Bob")
        .add_assertion("age", 30)
}

#[test]
fn test_digest_stable_across_insertion_order() {
    let forward = alice();
    let reverse = Envelope::new("Alice")
        .add_assertion("age", 30)
        .add_assertion("knows", "Bob");

    assert_eq!(forward.digest(), reverse.digest());
    assert_eq!(forward.to_cbor_data(), reverse.to_cbor_data());
}

#[test]
fn test_eliding_one_assertion() {
    init_tracing();
    let e = alice();
    let age = e.assertion_with_predicate("age").unwrap();

    let redacted = e.elide_removing_set(&HashSet::from([age.digest()]));

    assert_eq!(redacted.digest(), e.digest());
    assert_eq!(redacted.assertions().len(), 2);

    let plaintext: Vec<_> = redacted.assertions().iter().filter(|a| a.is_assertion()).collect();
    let elided: Vec<_> = redacted.assertions().iter().filter(|a| a.is_elided()).collect();
    assert_eq!(plaintext.len(), 1);
    assert_eq!(elided.len(), 1);
    assert_eq!(
        plaintext[0].as_predicate().unwrap().as_text(),
        Some("knows")
    );
    assert_eq!(elided[0].digest(), age.digest());
}

#[test]
fn test_encrypt_whole_envelope() {
    init_tracing();
    let e = alice();
    let k1 = SymmetricKey::generate();
    let k2 = SymmetricKey::generate();

    let encrypted = e.encrypt(&k1).unwrap();
    assert_eq!(encrypted.digest(), e.digest());

    let decrypted = encrypted.decrypt(&k1).unwrap();
    assert!(decrypted.is_identical_to(&e));
    assert_eq!(decrypted.to_cbor_data(), e.to_cbor_data());

    let err = encrypted.decrypt(&k2).unwrap_err();
    assert!(err.is_authentication_failure(), "unexpected error: {err}");
}

#[test]
fn test_walk_replace_changes_content() {
    let e = alice();
    let bob = Envelope::new("Bob").digest();

    let replaced = e
        .walk_replace(&HashSet::from([bob]), Envelope::new("Carol"))
        .unwrap();

    assert_eq!(
        replaced.object_for_predicate("knows").unwrap().as_text(),
        Some("Carol")
    );
    assert_ne!(replaced.digest(), e.digest());
}

#[test]
fn test_redact_then_transmit_then_verify() {
    init_tracing();
    let issuer = Keypair::from_seed(&[0x11; 32]);
    let credential = alice()
        .add_assertion(known_value::ISSUER, "Example Registry")
        .add_salt()
        .sign(&issuer);

    // Holder hides the age before presenting.
    let inner = credential.try_unwrap().unwrap();
    let age = inner.assertion_with_predicate("age").unwrap();
    let presented = credential.elide_removing_target(&age);

    let received = Envelope::from_cbor_data(&presented.to_cbor_data()).unwrap();
    assert_eq!(received.digest(), credential.digest());

    let content = received.verify(&issuer.public_key()).unwrap();
    assert_eq!(
        content.object_for_predicate("knows").unwrap().as_text(),
        Some("Bob")
    );
    assert!(matches!(
        content.object_for_predicate("age"),
        Err(EnvelopeError::AssertionNotFound)
    ));
}

#[test]
fn test_mixed_obscuring_then_restore() {
    init_tracing();
    let e = alice();
    let key = SymmetricKey::generate();
    let knows = e.assertion_with_predicate("knows").unwrap();
    let age = e.assertion_with_predicate("age").unwrap();

    let obscured = e
        .elide_removing_set_with_action(&HashSet::from([knows.digest()]), &ObscureAction::Encrypt(key.clone()))
        .unwrap()
        .elide_removing_set_with_action(&HashSet::from([age.digest()]), &ObscureAction::Compress)
        .unwrap()
        .elide_removing_target(&e.subject());

    assert_eq!(obscured.digest(), e.digest());
    assert_eq!(obscured.nodes_matching(None, &[ObscureType::Encrypted]), HashSet::from([knows.digest()]));
    assert_eq!(obscured.nodes_matching(None, &[ObscureType::Compressed]), HashSet::from([age.digest()]));

    let restored = obscured
        .walk_decrypt(&[key])
        .unwrap()
        .walk_decompress(None)
        .unwrap()
        .walk_unelide(&[e.subject()]);
    assert!(restored.is_identical_to(&e));
}

#[test]
fn test_inclusion_proof_for_bob() {
    let e = alice().add_salt();
    let bob = Envelope::new("Bob");

    let proof = e.proof_contains_target(&bob).unwrap();
    assert!(e.confirm_contains_target(&bob, &proof));
    assert!(proof.to_cbor_data().len() < e.to_cbor_data().len());
}

/// Asserts the envelope survives the wire, encryption and compression intact.
fn assert_round_trips(e: &Envelope, key: &SymmetricKey) {
    let decoded = Envelope::from_cbor_data(&e.to_cbor_data()).unwrap();
    assert!(decoded.is_identical_to(e));

    let decrypted = e.encrypt(key).unwrap().decrypt(key).unwrap();
    assert!(decrypted.is_identical_to(e));

    let decompressed = e.compress().unwrap().decompress().unwrap();
    assert!(decompressed.is_identical_to(e));
}

#[test]
fn test_annotate_obscured_then_restore() {
    init_tracing();
    let key = SymmetricKey::from_bytes([0x11; 32]);
    let e = alice();

    let sealed = e.encrypt(&key).unwrap().add_assertion(known_value::NOTE, "sealed");
    let by_walk = sealed.walk_decrypt(&[key.clone()]).unwrap();
    let by_subject = sealed.decrypt_subject(&key).unwrap();
    assert_eq!(by_walk.digest(), sealed.digest());
    assert!(by_walk.is_identical_to(&by_subject));
    assert!(by_walk.subject().is_identical_to(&e));
    assert_round_trips(&by_walk, &key);

    let packed = e.compress().unwrap().add_assertion(known_value::NOTE, "packed");
    let by_walk = packed.walk_decompress(None).unwrap();
    assert!(by_walk.is_identical_to(&packed.decompress_subject().unwrap()));
    assert!(by_walk.subject().is_node());
    assert_round_trips(&by_walk, &key);

    let hidden = e.elide().add_assertion(known_value::NOTE, "hidden");
    let restored = hidden.walk_unelide(&[e.clone()]);
    assert_eq!(restored.digest(), hidden.digest());
    assert!(restored.subject().is_node());
    assert_round_trips(&restored, &key);
}
