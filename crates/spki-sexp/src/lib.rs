//! # SPKI S-expressions
//!
//! The S-expression value type used by SPKI/SDSI (RFC 2693 and Rivest's
//! S-expression draft), with its two encodings:
//!
//! - **Canonical**: the unique byte encoding used for hashing and signing.
//!   See [`canonical`].
//! - **Advanced**: the human-readable transport form produced by
//!   [`Sexp`]'s `Display` and accepted by [`parse`].
//!
//! This crate knows nothing about keys or certificates. It is pure
//! computation over byte strings.
//!
//! ## Usage
//!
//! ```rust
//! use spki_sexp::Sexp;
//!
//! let sexp = Sexp::parse(b"(hash sha256 #00ff#)").unwrap();
//! assert_eq!(sexp.pack(), b"(4:hash6:sha2562:\x00\xff)".to_vec());
//! assert_eq!(sexp.to_string(), "(hash sha256 |AP8=|)");
//! ```

pub mod canonical;
pub mod error;
pub mod parse;
pub mod sexp;

pub use canonical::pack;
pub use error::SexpError;
pub use parse::{parse, parse_prefix, MAX_DEPTH};
pub use sexp::{Atom, Sexp};
