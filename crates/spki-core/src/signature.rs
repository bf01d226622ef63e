//! ECDSA signatures.
//!
//! ```text
//! (signature (hash sha256 |...|) PRINCIPAL (ecdsa-sha2 (r |...|) (s |...|)))
//! ```
//!
//! `PRINCIPAL` is either the signer's full public key or a hash of it. A
//! hash has to be resolved to a key through a [`KeyLookup`] supplied by
//! the caller.

use num_bigint::BigUint;
use spki_sexp::Sexp;
use std::fmt;

use crate::error::{Result, SpkiError};
use crate::expr::{named_uint, tagged, uint_term};
use crate::hash::Hash;
use crate::public_key::{PublicKey, SIGNATURE_ALGORITHM};

/// Resolves a principal hash to the public key it names.
///
/// Implementations should return a key only if it actually hashes to the
/// given value. The result is used as is; nothing is re-hashed.
pub trait KeyLookup {
    fn lookup(&self, hash: &Hash) -> Option<PublicKey>;
}

impl<F> KeyLookup for F
where
    F: Fn(&Hash) -> Option<PublicKey>,
{
    fn lookup(&self, hash: &Hash) -> Option<PublicKey> {
        self(hash)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Digest of the signed payload's canonical bytes.
    pub hash: Hash,
    pub principal: PublicKey,
    pub r: BigUint,
    pub s: BigUint,
}

impl Signature {
    /// Encode with the principal as a full public key.
    pub fn encode(&self) -> Sexp {
        self.encode_with_principal(self.principal.encode())
    }

    /// Encode with the principal as its natural hash.
    pub fn encode_with_principal_hash(&self) -> Result<Sexp> {
        Ok(self.encode_with_principal(self.principal.natural_hash()?.encode()))
    }

    fn encode_with_principal(&self, principal: Sexp) -> Sexp {
        Sexp::list(vec![
            Sexp::atom("signature"),
            self.hash.encode(),
            principal,
            Sexp::list(vec![
                Sexp::atom(SIGNATURE_ALGORITHM),
                uint_term("r", &self.r),
                uint_term("s", &self.s),
            ]),
        ])
    }

    pub fn pack(&self) -> Vec<u8> {
        self.encode().pack()
    }

    /// Decode a signature, resolving a hashed principal through `lookup`.
    ///
    /// A hashed principal that `lookup` cannot resolve, or any hashed
    /// principal when `lookup` is `None`, fails with
    /// [`SpkiError::HashNotFound`]. The lookup is consulted at most once.
    pub fn decode(sexp: &Sexp, lookup: Option<&dyn KeyLookup>) -> Result<Self> {
        let items = tagged(sexp, "signature")
            .filter(|items| items.len() == 4)
            .ok_or_else(|| malformed("expected (signature HASH PRINCIPAL VALUE)"))?;

        let hash = Hash::decode(&items[1])?;

        let principal = match items[2].head() {
            Some(b"hash") => {
                let principal_hash = Hash::decode(&items[2])?;
                match lookup.and_then(|lookup| lookup.lookup(&principal_hash)) {
                    Some(key) => key,
                    None => return Err(SpkiError::HashNotFound(principal_hash)),
                }
            }
            Some(b"public-key") => PublicKey::decode(&items[2])?,
            _ => return Err(malformed("principal must be a hash or a public key")),
        };

        if hash.algorithm != principal.curve.digest_algorithm() {
            return Err(malformed(format!(
                "{} principal signs {} digests, got {}",
                principal.curve,
                principal.curve.digest_algorithm(),
                hash.algorithm
            )));
        }

        let value = tagged(&items[3], SIGNATURE_ALGORITHM)
            .filter(|value| value.len() == 3)
            .ok_or_else(|| malformed("expected (ecdsa-sha2 (r R) (s S))"))?;
        let r = named_uint("r", &value[1]).map_err(malformed)?;
        let s = named_uint("s", &value[2]).map_err(malformed)?;

        Ok(Self {
            hash,
            principal,
            r,
            s,
        })
    }

    /// Check that `payload` hashes to the signed digest and that `(r, s)`
    /// is a valid signature of that digest by the principal.
    ///
    /// The digest must use the algorithm paired with the principal's curve.
    pub fn verify_payload(&self, payload: &Sexp) -> Result<()> {
        let expected = self.principal.curve.digest_algorithm();
        if self.hash.algorithm != expected {
            return Err(SpkiError::DigestAlgorithmMismatch {
                curve: self.principal.curve.name().to_string(),
                expected: expected.to_string(),
                actual: self.hash.algorithm.clone(),
            });
        }
        let actual = Hash::of(&self.hash.algorithm, payload)?;
        if actual != self.hash {
            return Err(SpkiError::DigestMismatch {
                expected: self.hash.to_hex(),
                actual: actual.to_hex(),
            });
        }
        self.principal
            .verify_prehash(&self.hash.digest, &self.r, &self.s)
    }

    pub fn verify(&self, payload: &Sexp) -> bool {
        self.verify_payload(payload).is_ok()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.encode(), f)
    }
}

fn malformed(reason: impl Into<String>) -> SpkiError {
    SpkiError::MalformedSignatureExpression(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Curve;
    use crate::key::Key;
    use crate::private_key::PrivateKey;

    fn signed() -> (PrivateKey, Sexp, Signature) {
        crate::init();
        let key = PrivateKey::random(Curve::P256).unwrap();
        let payload = Sexp::parse(b"(tag (read /home/alice))").unwrap();
        let signature = key.sign(&payload).unwrap();
        (key, payload, signature)
    }

    fn no_lookup(_: &Hash) -> Option<PublicKey> {
        None
    }

    #[test]
    fn test_encode_shape() {
        let (key, _, signature) = signed();
        let encoded = signature.encode();
        let items = encoded.as_list().unwrap();
        assert!(items[0].is_atom("signature"));
        assert_eq!(items[1], signature.hash.encode());
        assert_eq!(items[2], key.public_key().encode());
        assert!(items[3].is_list_of("ecdsa-sha2"));

        let hashed = signature.encode_with_principal_hash().unwrap();
        assert_eq!(
            hashed.as_list().unwrap()[2],
            key.public_key().natural_hash().unwrap().encode()
        );
    }

    #[test]
    fn test_decode_embedded_principal() {
        let (_, _, signature) = signed();
        let decoded = Signature::decode(&Sexp::parse(&signature.pack()).unwrap(), None).unwrap();
        assert_eq!(decoded, signature);
    }

    #[test]
    fn test_decode_reads_r_and_s_from_their_own_terms() {
        let (_, payload, signature) = signed();
        let decoded = Signature::decode(&signature.encode(), None).unwrap();
        assert_ne!(decoded.r, decoded.s);
        assert_eq!(decoded.r, signature.r);
        assert_eq!(decoded.s, signature.s);
        assert!(decoded.verify(&payload));
    }

    #[test]
    fn test_hash_principal_not_found() {
        let (_, _, signature) = signed();
        let sexp = signature.encode_with_principal_hash().unwrap();
        let expected = signature.principal.natural_hash().unwrap();

        let err = Signature::decode(&sexp, None).unwrap_err();
        assert!(matches!(err, SpkiError::HashNotFound(ref h) if *h == expected));

        let err = Signature::decode(&sexp, Some(&no_lookup)).unwrap_err();
        assert!(matches!(err, SpkiError::HashNotFound(_)));
    }

    #[test]
    fn test_hash_principal_resolved() {
        let (key, payload, signature) = signed();
        let public = key.public_key();
        let wanted = public.natural_hash().unwrap();
        let lookup = |hash: &Hash| (*hash == wanted).then(|| public.clone());

        let sexp = signature.encode_with_principal_hash().unwrap();
        let decoded = Signature::decode(&sexp, Some(&lookup)).unwrap();
        assert!(decoded.principal.equal(&Key::Public(public.clone())));
        assert!(decoded.verify(&payload));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let (_, payload, signature) = signed();
        assert!(signature.verify(&payload));

        let other = Sexp::parse(b"(tag (write /home/alice))").unwrap();
        assert!(matches!(
            signature.verify_payload(&other),
            Err(SpkiError::DigestMismatch { .. })
        ));

        let mut forged = signature.clone();
        forged.s = signature.r.clone();
        assert!(matches!(
            forged.verify_payload(&payload),
            Err(SpkiError::SignatureFailed)
        ));

        let mut wrong_key = signature.clone();
        wrong_key.principal = PrivateKey::random(Curve::P256).unwrap().public_key();
        assert!(!wrong_key.verify(&payload));
    }

    /// A p256 key signing a truncated sha512 digest, which ECDSA alone
    /// would accept.
    fn signed_with_sha512() -> (Sexp, Signature) {
        let (key, payload, _) = signed();
        let hash = Hash::of("sha512", &payload).unwrap();
        let (r, s) = key.curve.sign_prehash(key.scalar(), &hash.digest).unwrap();
        let signature = Signature {
            hash,
            principal: key.public_key(),
            r,
            s,
        };
        (payload, signature)
    }

    #[test]
    fn test_verify_rejects_digest_algorithm_of_other_curve() {
        let (payload, signature) = signed_with_sha512();
        assert!(matches!(
            signature.verify_payload(&payload),
            Err(SpkiError::DigestAlgorithmMismatch { ref actual, .. }) if actual == "sha512"
        ));
        assert!(!signature.verify(&payload));
    }

    #[test]
    fn test_decode_rejects_digest_algorithm_of_other_curve() {
        let (_, signature) = signed_with_sha512();
        let err = Signature::decode(&signature.encode(), None).unwrap_err();
        assert!(matches!(err, SpkiError::MalformedSignatureExpression(_)));

        let p384 = PrivateKey::random(Curve::P384).unwrap();
        let signature = p384.sign(&Sexp::atom("x")).unwrap();
        assert_eq!(signature.hash.algorithm, "sha384");
        assert!(Signature::decode(&signature.encode(), None).is_ok());
    }

    #[test]
    fn test_decode_malformed() {
        let (_, _, signature) = signed();
        let hash = signature.hash.encode().to_string();
        let principal = signature.principal.encode().to_string();
        for text in [
            "(signature)".to_string(),
            format!("(sig {} {} (ecdsa-sha2 (r #01#) (s #02#)))", hash, principal),
            format!("(signature {} (cert) (ecdsa-sha2 (r #01#) (s #02#)))", hash),
            format!("(signature {} {} (rsa-pkcs1 (r #01#) (s #02#)))", hash, principal),
            format!("(signature {} {} (ecdsa-sha2 (r #01#)))", hash, principal),
            format!("(signature {} {} (ecdsa-sha2 (r #01#) (r #02#)))", hash, principal),
        ] {
            let err = Signature::decode(&Sexp::parse(text.as_bytes()).unwrap(), None).unwrap_err();
            assert!(
                matches!(err, SpkiError::MalformedSignatureExpression(_)),
                "{}: {:?}",
                text,
                err
            );
        }
    }
}
