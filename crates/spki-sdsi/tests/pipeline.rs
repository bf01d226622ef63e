//! End-to-end tests: issue, bundle, transport as bytes, ingest, verify.

use spki_sdsi::core::SpkiError;
use spki_sdsi::sexp::{SexpError, MAX_DEPTH};
use spki_sdsi::{Error, Pipeline, PipelineConfig, PrivateKey, Sexp, SequenceElement};
use spki_testkit::fixtures::{interval, multi_party_fixtures, parse, TestFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn pipeline() -> Pipeline {
    init_tracing();
    Pipeline::new(PipelineConfig::default()).unwrap()
}

#[test]
fn test_issue_then_ingest() {
    let pipeline = pipeline();
    let parties = multi_party_fixtures(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    let valid = interval((2014, 1, 1), (2014, 12, 31));

    let sequence = pipeline
        .issue(&alice.key, bob.public_key(), parse("(tag (web (method GET)))"), Some(valid))
        .unwrap();
    let bytes = sequence.pack().unwrap();

    let receiver = Pipeline::new(PipelineConfig::default()).unwrap();
    let verified = receiver.ingest(&bytes).unwrap();

    let certs: Vec<_> = verified.signed_certs().collect();
    assert_eq!(certs.len(), 1);
    let cert = certs[0];
    assert_eq!(cert.issuer(), &alice.name(&[]));
    assert_eq!(cert.subject().subject().unwrap(), bob.public_key().subject().unwrap());
    assert_eq!(cert.valid(), Some(&valid));
    assert!(cert.delegate());

    // The issuer's key travelled with the sequence and is now known.
    assert!(receiver.key_ring().contains(&alice.public_key()));
}

#[test]
fn test_advanced_form_transport() {
    let pipeline = pipeline();
    let alice = TestFixture::with_scalar([0x0a; 32]);
    let bob = TestFixture::with_scalar([0x0b; 32]);

    let sequence = pipeline
        .issue(&alice.key, bob.public_key(), parse("(tag (*))"), None)
        .unwrap();
    let text = sequence.to_advanced().unwrap();

    let verified = pipeline.ingest(text.as_bytes()).unwrap();
    assert_eq!(verified.sequence().pack().unwrap(), sequence.pack().unwrap());
}

#[test]
fn test_hash_principal_resolves_through_key_ring() {
    let alice = TestFixture::with_scalar([0x1a; 32]);
    let cert = alice.issue_to(&TestFixture::with_scalar([0x1b; 32]), "(tag (read))");
    let signature = alice.sign(&cert.encode().unwrap());
    let bytes = Sexp::list(vec![
        Sexp::atom("sequence"),
        cert.encode().unwrap(),
        signature.encode_with_principal_hash().unwrap(),
    ])
    .pack();

    let stranger = pipeline();
    assert!(matches!(
        stranger.ingest(&bytes),
        Err(Error::Core(SpkiError::HashNotFound(_)))
    ));

    let friend = pipeline();
    friend.register(&alice.public_key()).unwrap();
    let verified = friend.ingest(&bytes).unwrap();
    assert!(verified.is_signed(0));
}

#[test]
fn test_tampered_certificate_fails() {
    let pipeline = pipeline();
    let parties = multi_party_fixtures(2);
    let (alice, bob) = (&parties[0], &parties[1]);

    let honest = alice.issue_to(bob, "(tag (read))");
    let forged = alice.issue_to(bob, "(tag (write))");
    let signature = alice.sign(&honest.encode().unwrap());

    let bytes = Sexp::list(vec![
        Sexp::atom("sequence"),
        forged.encode().unwrap(),
        signature.encode(),
    ])
    .pack();

    match pipeline.ingest(&bytes) {
        Err(Error::VerificationFailed { index, source }) => {
            assert_eq!(index, 1);
            assert!(matches!(source, SpkiError::DigestMismatch { .. }));
        }
        other => panic!("expected verification failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_rejected_sequence_registers_no_keys() {
    let pipeline = pipeline();
    let parties = multi_party_fixtures(3);
    let (alice, bob, mallory) = (&parties[0], &parties[1], &parties[2]);

    let honest = alice.issue_to(bob, "(tag (read))");
    let forged = alice.issue_to(mallory, "(tag (*))");
    let signature = alice.sign(&honest.encode().unwrap());
    let bytes = Sexp::list(vec![
        Sexp::atom("sequence"),
        mallory.public_key().encode(),
        forged.encode().unwrap(),
        signature.encode(),
    ])
    .pack();

    assert!(matches!(
        pipeline.ingest(&bytes),
        Err(Error::VerificationFailed { index: 2, .. })
    ));
    assert!(!pipeline.key_ring().contains(&mallory.public_key()));
    assert!(pipeline.key_ring().is_empty());

    // A later signature naming mallory by hash still cannot be resolved.
    let cert = mallory.issue_to(bob, "(tag (read))");
    let later = Sexp::list(vec![
        Sexp::atom("sequence"),
        cert.encode().unwrap(),
        mallory
            .sign(&cert.encode().unwrap())
            .encode_with_principal_hash()
            .unwrap(),
    ])
    .pack();
    assert!(matches!(
        pipeline.ingest(&later),
        Err(Error::Core(SpkiError::HashNotFound(_)))
    ));
}

#[test]
fn test_issuer_mismatch_registers_no_keys() {
    let pipeline = pipeline();
    let parties = multi_party_fixtures(3);
    let (alice, bob, mallory) = (&parties[0], &parties[1], &parties[2]);

    let cert = alice.issue_to(bob, "(tag (read))");
    let bytes = Sexp::list(vec![
        Sexp::atom("sequence"),
        mallory.public_key().encode(),
        cert.encode().unwrap(),
        mallory.sign(&cert.encode().unwrap()).encode(),
    ])
    .pack();

    assert!(matches!(
        pipeline.ingest(&bytes),
        Err(Error::IssuerMismatch { index: 1 })
    ));
    assert!(pipeline.key_ring().is_empty());
}

#[test]
fn test_deeply_nested_input_is_rejected() {
    let pipeline = pipeline();
    let mut bytes = b"(8:sequence".to_vec();
    bytes.extend(std::iter::repeat(b'(').take(100_000));
    assert!(matches!(
        pipeline.ingest(&bytes),
        Err(Error::Sexp(SexpError::TooDeep { .. }))
    ));

    let text = format!("(sequence {}x{})", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
    assert!(matches!(
        pipeline.ingest(text.as_bytes()),
        Err(Error::Sexp(SexpError::TooDeep { .. }))
    ));
}

#[test]
fn test_certificate_signed_by_someone_else() {
    let pipeline = pipeline();
    let parties = multi_party_fixtures(3);
    let (alice, bob, mallory) = (&parties[0], &parties[1], &parties[2]);

    let cert = alice.issue_to(bob, "(tag (read))");
    let signature = mallory.sign(&cert.encode().unwrap());
    let bytes = Sexp::list(vec![
        Sexp::atom("sequence"),
        cert.encode().unwrap(),
        signature.encode(),
    ])
    .pack();

    assert!(matches!(
        pipeline.ingest(&bytes),
        Err(Error::IssuerMismatch { index: 0 })
    ));
}

#[test]
fn test_verification_can_be_disabled() {
    init_tracing();
    let config = PipelineConfig {
        verify_signatures: false,
        register_sequence_keys: false,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config).unwrap();

    let parties = multi_party_fixtures(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    let signature = alice.sign(&parse("(tag (read))"));
    let bytes = Sexp::list(vec![
        Sexp::atom("sequence"),
        alice.public_key().encode(),
        alice.issue_to(bob, "(tag (write))").encode().unwrap(),
        signature.encode(),
    ])
    .pack();

    let verified = pipeline.ingest(&bytes).unwrap();
    assert_eq!(verified.signed_certs().count(), 0);
    assert!(pipeline.key_ring().is_empty());
    assert!(matches!(
        verified.sequence().elements()[2],
        SequenceElement::Signature(_)
    ));
}

#[test]
fn test_signature_over_signature() {
    let pipeline = pipeline();
    let parties = multi_party_fixtures(2);
    let (alice, bob) = (&parties[0], &parties[1]);

    let cert = alice.issue_to(bob, "(tag (read))");
    let first = alice.sign(&cert.encode().unwrap());
    let countersign = bob.sign(&first.encode());

    let bytes = Sexp::list(vec![
        Sexp::atom("sequence"),
        cert.encode().unwrap(),
        first.encode(),
        countersign.encode(),
    ])
    .pack();

    let verified = pipeline.ingest(&bytes).unwrap();
    assert!(verified.is_signed(0));
    assert!(verified.is_signed(1));
}

#[test]
fn test_config_from_json() {
    let config: PipelineConfig = serde_json::from_str(r#"{"verify_signatures": false}"#).unwrap();
    assert!(!config.verify_signatures);
    assert!(config.register_sequence_keys);
    assert_eq!(config.digest_algorithms.len(), 4);

    let config: PipelineConfig =
        serde_json::from_str(r#"{"digest_algorithms": ["sha256", "sha384"]}"#).unwrap();
    assert_eq!(config.digest_algorithms, vec!["sha256", "sha384"]);
}

#[test]
fn test_random_keys_round_trip() {
    let pipeline = pipeline();
    let issuer = PrivateKey::generate("(ecdsa-sha2 (curve p256))").unwrap();
    let subject = PrivateKey::random(spki_sdsi::Curve::P384).unwrap();
    let sequence = pipeline
        .issue(&issuer, subject.public_key(), parse("(tag (*))"), None)
        .unwrap();
    assert!(pipeline.ingest(&sequence.pack().unwrap()).is_ok());
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use spki_testkit::generators::{private_key, tag, valid};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_any_issued_sequence_ingests(
            issuer in private_key(),
            subject in private_key(),
            tag_expr in tag(),
            validity in prop::option::of(valid()),
        ) {
            let pipeline = pipeline();
            let sequence = pipeline.issue(&issuer, subject.public_key(), tag_expr, validity).unwrap();
            let verified = pipeline.ingest(&sequence.pack().unwrap()).unwrap();
            prop_assert_eq!(verified.signed_certs().count(), 1);
        }
    }
}
