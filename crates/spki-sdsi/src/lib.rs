//! # SPKI
//!
//! SPKI/SDSI authorization certificates and signatures over canonical
//! S-expressions.
//!
//! ## Overview
//!
//! - **Keys**: ECDSA keys on P-256 and P-384, or just a hash of one
//! - **Certificates**: an issuer grants a subject the authority in a tag
//! - **Signatures**: over the canonical bytes of any expression
//! - **Sequences**: a key, a certificate and its signature, bundled for
//!   transport and verified on receipt
//!
//! ## Usage
//!
//! ```rust
//! use spki_sdsi::{Curve, Pipeline, PipelineConfig, PrivateKey, Sexp};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//!
//! let issuer = PrivateKey::random(Curve::P256).unwrap();
//! let subject = PrivateKey::random(Curve::P256).unwrap().public_key();
//! let tag = Sexp::parse(b"(tag (ftp ftp.example.com))").unwrap();
//!
//! let sequence = pipeline.issue(&issuer, subject, tag, None).unwrap();
//! let verified = pipeline.ingest(&sequence.pack().unwrap()).unwrap();
//! assert_eq!(verified.signed_certs().count(), 1);
//! ```
//!
//! ## Re-exports
//!
//! - `spki_sdsi::core` - Keys, certificates, signatures and the digest registry
//! - `spki_sdsi::sexp` - The S-expression codec

pub mod error;
pub mod keyring;
pub mod pipeline;

pub use spki_core as core;
pub use spki_sexp as sexp;

pub use error::{Error, Result};
pub use keyring::KeyRing;
pub use pipeline::{Pipeline, PipelineConfig, VerifiedSequence};

pub use spki_core::{
    AuthCert, Curve, Hash, HashKey, Key, KeyLookup, Name, PrivateKey, PublicKey, Sequence,
    SequenceElement, Signature, Subject, Valid,
};
pub use spki_sexp::Sexp;
