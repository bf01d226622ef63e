//! # SPKI Core
//!
//! Pure primitives for SPKI/SDSI: the key capability model, SDSI names,
//! validity intervals, authorization certificates, signatures and
//! sequences, together with their canonical S-expression forms.
//!
//! This crate contains no I/O. Every operation is a pure transformation
//! between an in-memory value and its canonical expression, or a pure
//! computation (hash, intersect, sign, verify).
//!
//! ## Key Types
//!
//! - [`Hash`] - A digest value under a named algorithm
//! - [`Key`] - Closed sum of [`HashKey`], [`PublicKey`] and [`PrivateKey`]
//! - [`Name`] - A principal with an optional SDSI namespace path
//! - [`Valid`] - A validity interval with optional bounds
//! - [`AuthCert`] - An authorization certificate
//! - [`Signature`] - An ECDSA signature over a canonical payload
//! - [`Sequence`] - An ordered bundle of certificates, keys and signatures
//!
//! ## Initialization
//!
//! Hashing goes through the process-wide digest registry, which must be
//! installed before first use:
//!
//! ```rust
//! spki_core::init();
//!
//! let key = spki_core::PrivateKey::generate("(ecdsa-sha2 (curve p256))").unwrap();
//! let signature = key.sign(&spki_sexp::Sexp::atom("hello")).unwrap();
//! assert!(signature.verify(&spki_sexp::Sexp::atom("hello")));
//! ```

pub mod cert;
pub mod crypto;
pub mod digest;
pub mod error;
mod expr;
pub mod hash;
pub mod key;
pub mod name;
pub mod private_key;
pub mod public_key;
pub mod sequence;
pub mod signature;
pub mod subject;
pub mod valid;

pub use cert::AuthCert;
pub use crypto::Curve;
pub use digest::{init, DigestAlgorithm, DigestRegistry};
pub use error::{Result, SpkiError};
pub use hash::Hash;
pub use key::{HashKey, Key};
pub use name::Name;
pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use sequence::{Sequence, SequenceElement};
pub use signature::{KeyLookup, Signature};
pub use subject::Subject;
pub use valid::{Valid, V0_DATE_FORMAT};

pub use spki_sexp::Sexp;
