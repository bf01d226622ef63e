//! The signing and verification pipeline.
//!
//! A [`Pipeline`] owns a [`KeyRing`] and turns certificates into signed
//! sequences, and received sequences back into verified ones.

use serde::Deserialize;
use spki_core::{
    digest, AuthCert, DigestAlgorithm, DigestRegistry, Key, PrivateKey, PublicKey, Sequence,
    SequenceElement, Signature, SpkiError, Subject, Valid,
};
use spki_sexp::Sexp;

use crate::error::{Error, Result};
use crate::keyring::KeyRing;

/// Configuration for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether ingested signatures are checked against what they cover.
    pub verify_signatures: bool,
    /// Whether public keys carried in an ingested sequence join the key ring.
    pub register_sequence_keys: bool,
    /// Digest algorithms to install in the process-wide registry.
    pub digest_algorithms: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            verify_signatures: true,
            register_sequence_keys: true,
            digest_algorithms: DigestAlgorithm::ALL
                .iter()
                .map(|alg| alg.name().to_string())
                .collect(),
        }
    }
}

/// A decoded sequence together with what was verified in it.
#[derive(Debug, Clone)]
pub struct VerifiedSequence {
    sequence: Sequence,
    /// Indices of elements covered by a signature that verified.
    signed: Vec<usize>,
}

impl VerifiedSequence {
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn into_sequence(self) -> Sequence {
        self.sequence
    }

    /// True if the element at `index` is covered by a verified signature.
    pub fn is_signed(&self, index: usize) -> bool {
        self.signed.contains(&index)
    }

    /// Certificates covered by a verified signature from their issuer.
    pub fn signed_certs(&self) -> impl Iterator<Item = &AuthCert> + '_ {
        self.signed
            .iter()
            .filter_map(|&index| match &self.sequence.elements()[index] {
                SequenceElement::Cert(cert) => Some(cert),
                _ => None,
            })
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    keys: KeyRing,
}

impl Pipeline {
    /// Create a pipeline, installing the digest registry it asks for.
    ///
    /// The registry is process-wide and the first installation wins. If a
    /// different one is already installed it stays, with a warning.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        if config.digest_algorithms.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one digest algorithm is required".into(),
            ));
        }
        let wanted = DigestRegistry::with_algorithms(&config.digest_algorithms)?;
        match digest::install(wanted) {
            Ok(registry) => {
                tracing::debug!(algorithms = ?registry.names().collect::<Vec<_>>(), "installed digest registry");
            }
            Err((installed, rejected)) => {
                if !installed.names().eq(rejected.names()) {
                    tracing::warn!(
                        installed = ?installed.names().collect::<Vec<_>>(),
                        requested = ?rejected.names().collect::<Vec<_>>(),
                        "digest registry already installed with different algorithms"
                    );
                }
            }
        }

        Ok(Self {
            config,
            keys: KeyRing::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn key_ring(&self) -> &KeyRing {
        &self.keys
    }

    /// Make a key resolvable by its hashes.
    pub fn register(&self, key: &PublicKey) -> Result<()> {
        self.keys.register(key)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuing
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign a payload, registering the signer's public key.
    pub fn sign(&self, key: &PrivateKey, payload: &Sexp) -> Result<Signature> {
        let signature = key.sign(payload)?;
        self.register(&signature.principal)?;
        Ok(signature)
    }

    /// Issue a certificate and bundle it for transport.
    ///
    /// The sequence holds the issuer's public key, the certificate, and
    /// the issuer's signature over the certificate.
    pub fn issue(
        &self,
        issuer: &PrivateKey,
        subject: impl Into<Subject>,
        tag: Sexp,
        valid: Option<Valid>,
    ) -> Result<Sequence> {
        let cert = issuer.issue_auth_cert(subject, tag, valid);
        let signature = self.sign(issuer, &cert.encode()?)?;

        let mut sequence = Sequence::new();
        sequence.push(issuer.public_key());
        sequence.push(cert);
        sequence.push(signature);

        tracing::debug!(elements = sequence.len(), "issued certificate sequence");
        Ok(sequence)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ingesting
    // ─────────────────────────────────────────────────────────────────────────

    /// Parse, decode and verify a sequence received as bytes.
    ///
    /// Hashed principals resolve against keys earlier in the sequence, then
    /// against the key ring. Each signature is checked against the element
    /// immediately before it; a signed certificate must name the signer as
    /// its issuer (or be issued by `Self`). Public keys in the sequence join
    /// the key ring only once every check has passed.
    pub fn ingest(&self, bytes: &[u8]) -> Result<VerifiedSequence> {
        let sexp = Sexp::parse(bytes)?;
        let sequence = Sequence::decode(&sexp, Some(&self.keys)).map_err(|e| {
            if let SpkiError::HashNotFound(hash) = &e {
                tracing::warn!(digest = %hash.to_hex(), "unresolved signature principal");
            }
            e
        })?;

        let mut signed = Vec::new();
        for (index, element) in sequence.iter().enumerate() {
            let SequenceElement::Signature(signature) = element else {
                continue;
            };
            let covered = index
                .checked_sub(1)
                .map(|i| &sequence.elements()[i])
                .ok_or(Error::SignatureWithoutPayload { index })?;

            if !self.config.verify_signatures {
                continue;
            }

            signature
                .verify_payload(&covered.encode()?)
                .map_err(|source| {
                    tracing::warn!(index, error = %source, "signature failed verification");
                    Error::VerificationFailed { index, source }
                })?;

            if let SequenceElement::Cert(cert) = covered {
                check_issuer(cert, signature, index - 1)?;
            }
            signed.push(index - 1);
        }

        if self.config.register_sequence_keys {
            for element in &sequence {
                if let SequenceElement::PublicKey(key) = element {
                    self.register(key)?;
                }
            }
        }

        tracing::debug!(
            elements = sequence.len(),
            verified = signed.len(),
            "ingested sequence"
        );
        Ok(VerifiedSequence { sequence, signed })
    }
}

fn check_issuer(cert: &AuthCert, signature: &Signature, index: usize) -> Result<()> {
    match cert.issuer().principal.as_deref() {
        None => Ok(()),
        Some(issuer) if issuer.equal(&Key::Public(signature.principal.clone())) => Ok(()),
        Some(_) => {
            tracing::warn!(index, "certificate signed by a key other than its issuer");
            Err(Error::IssuerMismatch { index })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spki_core::Curve;

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.verify_signatures);
        assert!(config.register_sequence_keys);
        assert_eq!(
            config.digest_algorithms,
            vec!["sha224", "sha256", "sha384", "sha512"]
        );
    }

    #[test]
    fn test_rejects_empty_or_unknown_algorithms() {
        let config = PipelineConfig {
            digest_algorithms: Vec::new(),
            ..PipelineConfig::default()
        };
        assert!(matches!(Pipeline::new(config), Err(Error::InvalidConfig(_))));

        let config = PipelineConfig {
            digest_algorithms: vec!["sha256".into(), "md5".into()],
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(Error::Core(SpkiError::UnknownAlgorithm(_)))
        ));
    }

    #[test]
    fn test_sign_registers_signer() {
        let pipeline = pipeline();
        let key = PrivateKey::random(Curve::P256).unwrap();
        let signature = pipeline.sign(&key, &Sexp::atom("payload")).unwrap();
        assert!(pipeline.key_ring().contains(&key.public_key()));
        assert!(signature.verify(&Sexp::atom("payload")));
    }

    #[test]
    fn test_issue_shape() {
        let pipeline = pipeline();
        let issuer = PrivateKey::random(Curve::P256).unwrap();
        let subject = PrivateKey::random(Curve::P256).unwrap();
        let sequence = pipeline
            .issue(&issuer, subject.public_key(), Sexp::parse(b"(tag (*))").unwrap(), None)
            .unwrap();

        let elements = sequence.elements();
        assert_eq!(elements.len(), 3);
        assert!(matches!(&elements[0], SequenceElement::PublicKey(k) if *k == issuer.public_key()));
        assert!(matches!(&elements[1], SequenceElement::Cert(_)));
        assert!(matches!(&elements[2], SequenceElement::Signature(_)));
    }

    #[test]
    fn test_ingest_issued_sequence() {
        let pipeline = pipeline();
        let issuer = PrivateKey::random(Curve::P384).unwrap();
        let subject = PrivateKey::random(Curve::P256).unwrap();
        let packed = pipeline
            .issue(&issuer, subject.public_key(), Sexp::parse(b"(tag (*))").unwrap(), None)
            .unwrap()
            .pack()
            .unwrap();

        let verified = pipeline.ingest(&packed).unwrap();
        assert!(verified.is_signed(1));
        assert!(!verified.is_signed(0));
        assert_eq!(verified.signed_certs().count(), 1);
    }

    #[test]
    fn test_ingest_rejects_leading_signature() {
        let pipeline = pipeline();
        let key = PrivateKey::random(Curve::P256).unwrap();
        let signature = key.sign(&Sexp::atom("x")).unwrap();
        let sexp = Sexp::list(vec![Sexp::atom("sequence"), signature.encode()]);
        assert!(matches!(
            pipeline.ingest(&sexp.pack()),
            Err(Error::SignatureWithoutPayload { index: 0 })
        ));
    }

    #[test]
    fn test_ingest_rejects_garbage() {
        let pipeline = pipeline();
        assert!(matches!(pipeline.ingest(b"(sequence"), Err(Error::Sexp(_))));
        assert!(matches!(
            pipeline.ingest(b"(cert)"),
            Err(Error::Core(SpkiError::MalformedExpression(_)))
        ));
    }
}
