//! Error types for the pipeline.

use spki_core::SpkiError;
use spki_sexp::SexpError;
use thiserror::Error;

/// Errors that can occur while issuing or ingesting sequences.
#[derive(Debug, Error)]
pub enum Error {
    /// Decoding, hashing or signing failed.
    #[error("spki error: {0}")]
    Core(#[from] SpkiError),

    /// The input was not a well-formed S-expression.
    #[error("s-expression error: {0}")]
    Sexp(#[from] SexpError),

    /// A signature opened the sequence, so there is nothing for it to cover.
    #[error("signature at index {index} has no preceding element")]
    SignatureWithoutPayload { index: usize },

    /// A signature did not verify against the element before it.
    #[error("signature at index {index} failed verification: {source}")]
    VerificationFailed {
        index: usize,
        #[source]
        source: SpkiError,
    },

    /// A certificate was signed by a key other than its issuer.
    #[error("certificate at index {index} is not signed by its issuer")]
    IssuerMismatch { index: usize },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
