//! Golden test vectors for deterministic verification.
//!
//! Each vector fixes a secret scalar and a payload. The expected values
//! are the key's natural hash (over its canonical public-key expression)
//! and the payload digest a signature by that key would carry.

use spki_core::{Curve, Hash, PrivateKey};
use spki_sexp::Sexp;

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub curve: Curve,
    /// Secret scalar, big-endian.
    pub scalar: &'static [u8],
    /// Payload in advanced form.
    pub payload: &'static str,
    /// Expected hex digest of the public key under the curve's algorithm.
    pub expected_key_hash: &'static str,
    /// Expected hex digest of the canonical payload.
    pub expected_payload_hash: &'static str,
}

const SCALAR_42: [u8; 32] = [0x42; 32];
const SCALAR_01: [u8; 32] = [0x01; 32];
const SCALAR_07: [u8; 48] = [0x07; 48];

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "p256 key, ftp tag",
            curve: Curve::P256,
            scalar: &SCALAR_42,
            payload: "(tag (ftp ftp.example.com))",
            expected_key_hash: "3aed7938b4d38f89caa13110d38e59ccd09e573797673316e64c8f4cb853f75f",
            expected_payload_hash: "7176b3f190fca4f48b80fdcb7ecc16bb1eeee7ce2b72390c68d667d38e99850a",
        },
        GoldenVector {
            name: "p256 key, wildcard tag",
            curve: Curve::P256,
            scalar: &SCALAR_01,
            payload: "(tag (*))",
            expected_key_hash: "79218b25e6adf44e1d662a2cc5fd541882c79dbb116cbb4a282b33433ff36224",
            expected_payload_hash: "c995f05cc93b672907452d64a745b4af7b13db13dd6b8ad8cba8cc82ee05a360",
        },
        GoldenVector {
            name: "p384 key, atom payload",
            curve: Curve::P384,
            scalar: &SCALAR_07,
            payload: "hello",
            expected_key_hash: "0997cbb6042c451baff3fabbf167905a6cad7f165f74e55718b21302a1504d4a4f3bd07101eac28356cf20de8dde05ce",
            expected_payload_hash: "515b938157c6d01cd786d527d175bd291317d9d2fe2b6ecef464c95bbd6ae704a6550ff8172e12cc345a31b6582f54f9",
        },
    ]
}

/// The key a vector describes.
pub fn key_from_vector(vector: &GoldenVector) -> PrivateKey {
    spki_core::init();
    PrivateKey::from_scalar(vector.curve, vector.scalar).expect("vector scalar in range")
}

pub fn payload_from_vector(vector: &GoldenVector) -> Sexp {
    Sexp::parse(vector.payload.as_bytes()).expect("vector payload parses")
}

/// Check every vector, returning `(name, matches, computed key hash)`.
///
/// A vector with empty expectations only reports what was computed.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let key = key_from_vector(v);
            let key_hash = key
                .public_key()
                .natural_hash()
                .map(|hash| hash.to_hex())
                .unwrap_or_default();
            let payload_hash = Hash::of(v.curve.digest_algorithm(), &payload_from_vector(v))
                .map(|hash| hash.to_hex())
                .unwrap_or_default();

            let matches = (v.expected_key_hash.is_empty() || key_hash == v.expected_key_hash)
                && (v.expected_payload_hash.is_empty() || payload_hash == v.expected_payload_hash);

            (v.name.to_string(), matches, key_hash)
        })
        .collect()
}
