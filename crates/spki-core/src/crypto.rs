//! ECDSA glue for the two supported NIST curves.
//!
//! Signing and verification operate on digests the caller has already
//! computed (the SPKI signature hash), never on the raw payload. Integers
//! cross this boundary as [`BigUint`] and are padded to the field size
//! only here.

use num_bigint::BigUint;
use std::fmt;

use crate::error::{Result, SpkiError};

/// A supported elliptic curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    P256,
    P384,
}

impl Curve {
    /// The SPKI curve name, as it appears in `(curve NAME)`.
    pub const fn name(&self) -> &'static str {
        match self {
            Curve::P256 => "p256",
            Curve::P384 => "p384",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "p256" => Ok(Curve::P256),
            "p384" => Ok(Curve::P384),
            other => Err(SpkiError::UnsupportedCurve(other.to_string())),
        }
    }

    /// The digest paired with this curve for signing and for the key's
    /// natural subject hash.
    pub const fn digest_algorithm(&self) -> &'static str {
        match self {
            Curve::P256 => "sha256",
            Curve::P384 => "sha384",
        }
    }

    /// Coordinate and scalar width in bytes.
    pub const fn field_size(&self) -> usize {
        match self {
            Curve::P256 => 32,
            Curve::P384 => 48,
        }
    }

    /// A fresh random keypair as `(d, x, y)`.
    pub(crate) fn generate(&self) -> Result<(BigUint, BigUint, BigUint)> {
        match self {
            Curve::P256 => p256_ecdsa::generate(),
            Curve::P384 => p384_ecdsa::generate(),
        }
    }

    /// The public point `d·G`.
    pub(crate) fn derive_point(&self, d: &BigUint) -> Result<(BigUint, BigUint)> {
        match self {
            Curve::P256 => p256_ecdsa::derive_point(d),
            Curve::P384 => p384_ecdsa::derive_point(d),
        }
    }

    /// Sign a digest, returning `(r, s)`. Nonces are derived per RFC 6979.
    pub(crate) fn sign_prehash(&self, d: &BigUint, digest: &[u8]) -> Result<(BigUint, BigUint)> {
        match self {
            Curve::P256 => p256_ecdsa::sign_prehash(d, digest),
            Curve::P384 => p384_ecdsa::sign_prehash(d, digest),
        }
    }

    pub(crate) fn verify_prehash(
        &self,
        x: &BigUint,
        y: &BigUint,
        digest: &[u8],
        r: &BigUint,
        s: &BigUint,
    ) -> Result<()> {
        match self {
            Curve::P256 => p256_ecdsa::verify_prehash(x, y, digest, r, s),
            Curve::P384 => p384_ecdsa::verify_prehash(x, y, digest, r, s),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Left-pad `n` to exactly `size` big-endian bytes.
fn field_bytes(n: &BigUint, size: usize) -> Result<Vec<u8>> {
    let bytes = n.to_bytes_be();
    if bytes.len() > size {
        return Err(SpkiError::InvalidKey(format!(
            "integer of {} bytes exceeds field size {}",
            bytes.len(),
            size
        )));
    }
    let mut padded = vec![0u8; size - bytes.len()];
    padded.extend_from_slice(&bytes);
    Ok(padded)
}

macro_rules! ecdsa_curve {
    ($module:ident, $krate:ident, $size:expr) => {
        mod $module {
            use ::$krate::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
            use ::$krate::ecdsa::{Signature, SigningKey, VerifyingKey};
            use num_bigint::BigUint;
            use rand::rngs::OsRng;

            use super::field_bytes;
            use crate::error::{Result, SpkiError};

            fn signing_key(d: &BigUint) -> Result<SigningKey> {
                let bytes = field_bytes(d, $size)?;
                SigningKey::from_slice(&bytes)
                    .map_err(|_| SpkiError::InvalidKey("private scalar out of range".into()))
            }

            fn point(key: &VerifyingKey) -> Result<(BigUint, BigUint)> {
                let encoded = key.to_encoded_point(false);
                match (encoded.x(), encoded.y()) {
                    (Some(x), Some(y)) => {
                        Ok((BigUint::from_bytes_be(x), BigUint::from_bytes_be(y)))
                    }
                    _ => Err(SpkiError::InvalidKey("point at infinity".into())),
                }
            }

            pub(super) fn generate() -> Result<(BigUint, BigUint, BigUint)> {
                let key = SigningKey::random(&mut OsRng);
                let (x, y) = point(key.verifying_key())?;
                Ok((BigUint::from_bytes_be(&key.to_bytes()), x, y))
            }

            pub(super) fn derive_point(d: &BigUint) -> Result<(BigUint, BigUint)> {
                point(signing_key(d)?.verifying_key())
            }

            pub(super) fn sign_prehash(d: &BigUint, digest: &[u8]) -> Result<(BigUint, BigUint)> {
                let signature: Signature = signing_key(d)?
                    .sign_prehash(digest)
                    .map_err(|_| SpkiError::SignatureFailed)?;
                let (r, s) = signature.split_bytes();
                Ok((BigUint::from_bytes_be(&r), BigUint::from_bytes_be(&s)))
            }

            pub(super) fn verify_prehash(
                x: &BigUint,
                y: &BigUint,
                digest: &[u8],
                r: &BigUint,
                s: &BigUint,
            ) -> Result<()> {
                let mut sec1 = Vec::with_capacity(1 + 2 * $size);
                sec1.push(0x04);
                sec1.extend_from_slice(&field_bytes(x, $size)?);
                sec1.extend_from_slice(&field_bytes(y, $size)?);
                let key = VerifyingKey::from_sec1_bytes(&sec1)
                    .map_err(|_| SpkiError::InvalidKey("point is not on the curve".into()))?;

                let mut rs = field_bytes(r, $size).map_err(|_| SpkiError::SignatureFailed)?;
                rs.extend(field_bytes(s, $size).map_err(|_| SpkiError::SignatureFailed)?);
                let signature =
                    Signature::from_slice(&rs).map_err(|_| SpkiError::SignatureFailed)?;

                key.verify_prehash(digest, &signature)
                    .map_err(|_| SpkiError::SignatureFailed)
            }
        }
    };
}

ecdsa_curve!(p256_ecdsa, p256, 32);
ecdsa_curve!(p384_ecdsa, p384, 48);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::DigestAlgorithm;

    #[test]
    fn test_curve_names() {
        assert_eq!(Curve::from_name("p256").unwrap(), Curve::P256);
        assert_eq!(Curve::from_name("p384").unwrap(), Curve::P384);
        assert!(matches!(
            Curve::from_name("p512"),
            Err(SpkiError::UnsupportedCurve(name)) if name == "p512"
        ));
        assert_eq!(Curve::P384.to_string(), "p384");
    }

    #[test]
    fn test_generate_matches_derived_point() {
        for curve in [Curve::P256, Curve::P384] {
            let (d, x, y) = curve.generate().unwrap();
            assert_eq!(curve.derive_point(&d).unwrap(), (x, y));
        }
    }

    #[test]
    fn test_sign_verify_prehash() {
        for curve in [Curve::P256, Curve::P384] {
            let alg = DigestAlgorithm::from_name(curve.digest_algorithm()).unwrap();
            let digest = alg.digest(b"payload");
            let (d, x, y) = curve.generate().unwrap();

            let (r, s) = curve.sign_prehash(&d, &digest).unwrap();
            assert_ne!(r, s);
            curve.verify_prehash(&x, &y, &digest, &r, &s).unwrap();

            let other = alg.digest(b"other payload");
            assert!(matches!(
                curve.verify_prehash(&x, &y, &other, &r, &s),
                Err(SpkiError::SignatureFailed)
            ));
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let d = BigUint::from(0x1234_5678u32);
        let digest = DigestAlgorithm::SHA256.digest(b"x");
        let a = Curve::P256.sign_prehash(&d, &digest).unwrap();
        let b = Curve::P256.sign_prehash(&d, &digest).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_scalars_and_points() {
        let zero = BigUint::from(0u8);
        assert!(matches!(Curve::P256.derive_point(&zero), Err(SpkiError::InvalidKey(_))));

        let too_wide = BigUint::from_bytes_be(&[1u8; 33]);
        assert!(matches!(Curve::P256.derive_point(&too_wide), Err(SpkiError::InvalidKey(_))));

        let digest = DigestAlgorithm::SHA256.digest(b"x");
        let one = BigUint::from(1u8);
        assert!(matches!(
            Curve::P256.verify_prehash(&one, &one, &digest, &one, &one),
            Err(SpkiError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_out_of_range_signature_scalars_fail() {
        for curve in [Curve::P256, Curve::P384] {
            let alg = DigestAlgorithm::from_name(curve.digest_algorithm()).unwrap();
            let digest = alg.digest(b"payload");
            let (d, x, y) = curve.generate().unwrap();
            let (r, s) = curve.sign_prehash(&d, &digest).unwrap();

            let zero = BigUint::from(0u8);
            let too_wide = BigUint::from_bytes_be(&vec![0xff; curve.field_size() + 1]);
            for (r, s) in [(&zero, &s), (&r, &zero), (&too_wide, &s)] {
                assert!(matches!(
                    curve.verify_prehash(&x, &y, &digest, r, s),
                    Err(SpkiError::SignatureFailed)
                ));
            }
        }
    }

    #[test]
    fn test_field_bytes_pads() {
        assert_eq!(field_bytes(&BigUint::from(1u8), 4).unwrap(), vec![0, 0, 0, 1]);
        assert!(field_bytes(&BigUint::from(0x1_0000_0000u64), 4).is_err());
    }
}
