//! ECDSA public keys.
//!
//! ```text
//! (public-key (ecdsa-sha2 (curve p256) (x |...|) (y |...|)))
//! ```

use num_bigint::BigUint;
use spki_sexp::Sexp;
use std::fmt;

use crate::crypto::Curve;
use crate::digest;
use crate::error::{Result, SpkiError};
use crate::expr::{named_atom, named_uint, tagged, term, uint_term};
use crate::hash::Hash;
use crate::key::{HashCache, Key};

pub(crate) const SIGNATURE_ALGORITHM: &str = "ecdsa-sha2";

/// A point on P-256 or P-384.
///
/// [`PublicKey::hash_expr`] memoizes every hash it computes. Hashes that
/// are already known (for instance because a key ring looked the key up by
/// one of them) can be seeded with [`PublicKey::with_cached_hash`]. Clones
/// start with a copy of the cache.
#[derive(Clone)]
pub struct PublicKey {
    pub curve: Curve,
    pub x: BigUint,
    pub y: BigUint,
    cache: HashCache,
}

impl PublicKey {
    pub fn new(curve: Curve, x: BigUint, y: BigUint) -> Self {
        Self {
            curve,
            x,
            y,
            cache: HashCache::default(),
        }
    }

    /// Record a known hash of this key.
    ///
    /// The caller vouches that `hash` really is a digest of [`PublicKey::pack`].
    pub fn with_cached_hash(self, hash: Hash) -> Self {
        self.cache.insert(hash);
        self
    }

    pub fn cached_hashes(&self) -> Vec<Hash> {
        self.cache.snapshot()
    }

    pub fn decode(sexp: &Sexp) -> Result<Self> {
        let (curve, x, y, _) = decode_ecdsa(sexp, "public-key", false)?;
        Ok(Self::new(curve, x, y))
    }

    pub fn encode(&self) -> Sexp {
        encode_ecdsa("public-key", self.curve, &self.x, &self.y, None)
    }

    pub fn pack(&self) -> Vec<u8> {
        self.encode().pack()
    }

    pub fn hashed(&self, algorithm: &str) -> Result<Vec<u8>> {
        self.hash_expr(algorithm).map(|hash| hash.digest)
    }

    /// The hash of this key's canonical bytes, from the cache if possible.
    pub fn hash_expr(&self, algorithm: &str) -> Result<Hash> {
        self.cache
            .get_or_compute(algorithm, || Hash::compute(algorithm, &self.pack()))
    }

    pub fn signature_algorithm(&self) -> &'static str {
        SIGNATURE_ALGORITHM
    }

    /// The curve name, e.g. `p256`.
    pub fn hash_algorithm(&self) -> &'static str {
        self.curve.name()
    }

    /// The hash under the digest paired with this key's curve.
    pub fn natural_hash(&self) -> Result<Hash> {
        self.hash_expr(self.curve.digest_algorithm())
    }

    /// The subject expression naming this key.
    pub fn subject(&self) -> Result<Sexp> {
        self.natural_hash().map(|hash| hash.encode())
    }

    /// True if any registered algorithm yields the same hash for both keys.
    pub fn equal(&self, other: &Key) -> bool {
        equal_under_any_algorithm(|alg| self.hash_expr(alg), other)
    }

    pub(crate) fn verify_prehash(&self, digest: &[u8], r: &BigUint, s: &BigUint) -> Result<()> {
        self.curve.verify_prehash(&self.x, &self.y, digest, r, s)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve && self.x == other.x && self.y == other.y
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.encode(), f)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("curve", &self.curve)
            .field("x", &self.x.to_str_radix(16))
            .field("y", &self.y.to_str_radix(16))
            .finish()
    }
}

/// Scan the registry in name order; the first algorithm under which both
/// sides hash identically decides equality.
///
/// One matching algorithm is enough. A key compared against a forged key
/// whose hash collides under any single registered digest will compare
/// equal.
pub(crate) fn equal_under_any_algorithm<F>(hash_expr: F, other: &Key) -> bool
where
    F: Fn(&str) -> Result<Hash>,
{
    let Ok(registry) = digest::registry() else {
        return false;
    };
    registry.names().any(|alg| match (hash_expr(alg), other.hash_expr(alg)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    })
}

/// Decode `(OUTER (ecdsa-sha2 (curve C) (x X) (y Y) [(d D)]))`.
pub(crate) fn decode_ecdsa(
    sexp: &Sexp,
    outer: &str,
    with_scalar: bool,
) -> Result<(Curve, BigUint, BigUint, Option<BigUint>)> {
    let items = tagged(sexp, outer)
        .filter(|items| items.len() == 2)
        .ok_or_else(|| malformed(format!("expected ({} ALGORITHM)", outer)))?;
    let inner = tagged(&items[1], SIGNATURE_ALGORITHM)
        .ok_or_else(|| malformed(format!("expected ({} ...)", SIGNATURE_ALGORITHM)))?;

    let expected = if with_scalar { 5 } else { 4 };
    if inner.len() != expected {
        return Err(malformed(format!(
            "{} parameters must have {} elements, got {}",
            outer,
            expected,
            inner.len()
        )));
    }

    let name = named_atom("curve", &inner[1]).map_err(malformed)?;
    let curve = Curve::from_name(&String::from_utf8_lossy(name))?;
    let x = named_uint("x", &inner[2]).map_err(malformed)?;
    let y = named_uint("y", &inner[3]).map_err(malformed)?;
    let d = if with_scalar {
        Some(named_uint("d", &inner[4]).map_err(malformed)?)
    } else {
        None
    };
    Ok((curve, x, y, d))
}

pub(crate) fn encode_ecdsa(
    outer: &str,
    curve: Curve,
    x: &BigUint,
    y: &BigUint,
    d: Option<&BigUint>,
) -> Sexp {
    let mut params = vec![
        Sexp::atom(SIGNATURE_ALGORITHM),
        term("curve", curve.name()),
        uint_term("x", x),
        uint_term("y", y),
    ];
    if let Some(d) = d {
        params.push(uint_term("d", d));
    }
    Sexp::list(vec![Sexp::atom(outer), Sexp::list(params)])
}

fn malformed(reason: impl Into<String>) -> SpkiError {
    SpkiError::MalformedKeyExpression(reason.into())
}
