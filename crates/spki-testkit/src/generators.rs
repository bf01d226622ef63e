//! Proptest generators for property-based testing.

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use spki_core::{AuthCert, Curve, Hash, PrivateKey, Subject, Valid};
use spki_sexp::Sexp;

/// Generate a P-256 secret scalar, non-zero and below the group order.
pub fn scalar() -> impl Strategy<Value = [u8; 32]> {
    (1u8..=0x7f, any::<[u8; 31]>()).prop_map(|(first, rest)| {
        let mut scalar = [0u8; 32];
        scalar[0] = first;
        scalar[1..].copy_from_slice(&rest);
        scalar
    })
}

/// Generate a P-256 private key.
pub fn private_key() -> impl Strategy<Value = PrivateKey> {
    scalar().prop_map(|scalar| {
        spki_core::init();
        PrivateKey::from_scalar(Curve::P256, &scalar).expect("scalar in range")
    })
}

/// Generate atom bytes of any content.
pub fn atom_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate an identifier usable as a token and as an SDSI name.
pub fn token() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate an arbitrary S-expression, at most a few levels deep.
pub fn sexp() -> impl Strategy<Value = Sexp> {
    let leaf = prop_oneof![
        atom_bytes(24).prop_map(|bytes| Sexp::atom(bytes)),
        token().prop_map(|t| Sexp::atom(t)),
        (token(), token()).prop_map(|(hint, value)| Sexp::hinted(hint, value)),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Sexp::List)
    })
}

/// Generate a `(tag ...)` expression.
pub fn tag() -> impl Strategy<Value = Sexp> {
    prop::collection::vec(sexp(), 0..3).prop_map(|body| {
        let mut items = vec![Sexp::atom("tag")];
        items.extend(body);
        Sexp::List(items)
    })
}

/// Generate an optional whole-second timestamp between 1970 and 2096.
pub fn timestamp() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop::option::of(
        (0i64..4_000_000_000).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_default()),
    )
}

/// Generate a validity interval, possibly empty or unbounded.
pub fn valid() -> impl Strategy<Value = Valid> {
    (timestamp(), timestamp()).prop_map(|(not_before, not_after)| Valid::new(not_before, not_after))
}

/// Generate a digest under one of the standard algorithms.
pub fn hash() -> impl Strategy<Value = Hash> {
    (
        prop_oneof![
            Just(("sha224", 28usize)),
            Just(("sha256", 32)),
            Just(("sha384", 48)),
            Just(("sha512", 64)),
        ],
        prop::collection::vec(any::<u8>(), 64),
    )
        .prop_map(|((algorithm, size), mut bytes)| {
            bytes.truncate(size);
            Hash::new(algorithm, bytes)
        })
}

/// Parameters for generating a certificate.
#[derive(Debug, Clone)]
pub struct CertParams {
    pub issuer: PrivateKey,
    pub subject: PrivateKey,
    pub tag: Sexp,
    pub delegate: bool,
    pub valid: Option<Valid>,
}

impl Arbitrary for CertParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            private_key(),
            private_key(),
            tag(),
            any::<bool>(),
            prop::option::of(valid()),
        )
            .prop_map(|(issuer, subject, tag, delegate, valid)| CertParams {
                issuer,
                subject,
                tag,
                delegate,
                valid,
            })
            .boxed()
    }
}

/// Build a certificate from parameters.
pub fn cert_from_params(params: &CertParams) -> AuthCert {
    let mut cert = params
        .issuer
        .issue_auth_cert(
            Subject::from(params.subject.public_key()),
            params.tag.clone(),
            None,
        )
        .with_delegation(params.delegate);
    if let Some(valid) = params.valid {
        cert = cert.with_validity(valid);
    }
    cert
}
