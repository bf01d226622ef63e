//! ECDSA private keys, signing, and certificate issuance.
//!
//! ```text
//! (private-key (ecdsa-sha2 (curve p256) (x |...|) (y |...|) (d |...|)))
//! ```
//!
//! The public point is stored alongside `d` and is trusted as given when
//! decoding; [`PrivateKey::from_scalar`] derives it.

use num_bigint::BigUint;
use spki_sexp::Sexp;
use std::fmt;
use std::sync::Arc;

use crate::cert::AuthCert;
use crate::crypto::Curve;
use crate::error::{Result, SpkiError};
use crate::hash::Hash;
use crate::key::{HashCache, Key};
use crate::name::Name;
use crate::public_key::{
    decode_ecdsa, encode_ecdsa, equal_under_any_algorithm, PublicKey, SIGNATURE_ALGORITHM,
};
use crate::signature::Signature;
use crate::subject::Subject;
use crate::valid::Valid;

/// An ECDSA keypair. Hashes of the public half are memoized like
/// [`PublicKey`]'s and handed on by [`PrivateKey::public_key`].
#[derive(Clone)]
pub struct PrivateKey {
    pub curve: Curve,
    pub x: BigUint,
    pub y: BigUint,
    d: BigUint,
    cache: HashCache,
}

impl PrivateKey {
    /// Assemble a key from parts. The point is not checked against `d`.
    pub fn new(curve: Curve, x: BigUint, y: BigUint, d: BigUint) -> Self {
        Self {
            curve,
            x,
            y,
            d,
            cache: HashCache::default(),
        }
    }

    /// Build a key from a big-endian secret scalar, deriving the point.
    pub fn from_scalar(curve: Curve, d: &[u8]) -> Result<Self> {
        let d = BigUint::from_bytes_be(d);
        let (x, y) = curve.derive_point(&d)?;
        Ok(Self::new(curve, x, y, d))
    }

    /// A fresh key from the operating system's random source.
    pub fn random(curve: Curve) -> Result<Self> {
        let (d, x, y) = curve.generate()?;
        Ok(Self::new(curve, x, y, d))
    }

    /// Generate a key for an algorithm specifier.
    ///
    /// Only `(ecdsa-sha2 (curve p256))` is recognized.
    pub fn generate(specifier: &str) -> Result<Self> {
        let p256 = Sexp::list(vec![
            Sexp::atom(SIGNATURE_ALGORITHM),
            Sexp::list(vec![Sexp::atom("curve"), Sexp::atom(Curve::P256.name())]),
        ]);
        match Sexp::parse(specifier.as_bytes()) {
            Ok(requested) if requested == p256 => Self::random(Curve::P256),
            _ => Err(SpkiError::UnknownAlgorithm(specifier.to_string())),
        }
    }

    pub fn decode(sexp: &Sexp) -> Result<Self> {
        match decode_ecdsa(sexp, "private-key", true)? {
            (curve, x, y, Some(d)) => Ok(Self::new(curve, x, y, d)),
            _ => Err(SpkiError::MalformedKeyExpression("missing (d ...)".into())),
        }
    }

    pub fn encode(&self) -> Sexp {
        encode_ecdsa("private-key", self.curve, &self.x, &self.y, Some(&self.d))
    }

    pub fn pack(&self) -> Vec<u8> {
        self.encode().pack()
    }

    /// The secret scalar.
    pub fn scalar(&self) -> &BigUint {
        &self.d
    }

    /// The stored point as a public key.
    pub fn public_key(&self) -> PublicKey {
        self.cache.snapshot().into_iter().fold(
            PublicKey::new(self.curve, self.x.clone(), self.y.clone()),
            PublicKey::with_cached_hash,
        )
    }

    pub fn hashed(&self, algorithm: &str) -> Result<Vec<u8>> {
        self.hash_expr(algorithm).map(|hash| hash.digest)
    }

    /// Hash of the public key; the scalar is never hashed.
    pub fn hash_expr(&self, algorithm: &str) -> Result<Hash> {
        self.cache.get_or_compute(algorithm, || {
            Hash::compute(algorithm, &self.public_key().pack())
        })
    }

    pub fn signature_algorithm(&self) -> &'static str {
        SIGNATURE_ALGORITHM
    }

    pub fn hash_algorithm(&self) -> &'static str {
        self.curve.name()
    }

    pub fn subject(&self) -> Result<Sexp> {
        self.public_key().subject()
    }

    /// True if any registered algorithm yields the same hash for both keys.
    pub fn equal(&self, other: &Key) -> bool {
        equal_under_any_algorithm(|alg| self.hash_expr(alg), other)
    }

    /// Sign the canonical bytes of `payload`.
    ///
    /// The payload is digested under the curve's paired algorithm (sha256
    /// for p256, sha384 for p384) and the digest is signed.
    pub fn sign(&self, payload: &Sexp) -> Result<Signature> {
        let algorithm = self.curve.digest_algorithm();
        let hash = Hash::of(algorithm, payload)?;
        let (r, s) = self.curve.sign_prehash(&self.d, &hash.digest)?;

        tracing::debug!(
            curve = %self.curve,
            algorithm,
            digest = %hash.to_hex(),
            "signed payload"
        );

        Ok(Signature {
            hash,
            principal: self.public_key(),
            r,
            s,
        })
    }

    /// Issue a delegable authorization certificate from this key.
    pub fn issue_auth_cert(
        &self,
        subject: impl Into<Subject>,
        tag: Sexp,
        valid: Option<Valid>,
    ) -> AuthCert {
        let issuer = Name::of_key(Arc::new(Key::Public(self.public_key())));
        let cert = AuthCert::new(issuer, subject.into(), tag).with_delegation(true);
        tracing::debug!(curve = %self.curve, "issued auth cert");
        match valid {
            Some(valid) => cert.with_validity(valid),
            None => cert,
        }
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve && self.x == other.x && self.y == other.y && self.d == other.d
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve)
            .field("x", &self.x.to_str_radix(16))
            .field("y", &self.y.to_str_radix(16))
            .field("d", &"<redacted>")
            .finish()
    }
}
