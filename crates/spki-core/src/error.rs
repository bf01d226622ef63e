//! Error types for SPKI Core.

use spki_sexp::SexpError;
use thiserror::Error;

use crate::hash::Hash;

/// Errors that can occur while decoding, hashing, signing or verifying.
#[derive(Debug, Error)]
pub enum SpkiError {
    #[error("invalid hash expression: {0}")]
    InvalidHashExpression(String),

    #[error("malformed key expression: {0}")]
    MalformedKeyExpression(String),

    #[error("malformed signature expression: {0}")]
    MalformedSignatureExpression(String),

    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("no hash found for algorithm {0}")]
    NoHashForAlgorithm(String),

    #[error("hash value {0} not found")]
    HashNotFound(Hash),

    #[error("digest registry has not been initialized")]
    RegistryUninitialized,

    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signature verification failed")]
    SignatureFailed,

    #[error("digest mismatch: signature covers {expected}, payload hashes to {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("{curve} signatures use {expected} digests, got {actual}")]
    DigestAlgorithmMismatch {
        curve: String,
        expected: String,
        actual: String,
    },

    #[error("s-expression error: {0}")]
    Sexp(#[from] SexpError),
}

impl SpkiError {
    /// True for errors caused by an expression of the wrong shape.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            SpkiError::InvalidHashExpression(_)
                | SpkiError::MalformedKeyExpression(_)
                | SpkiError::MalformedSignatureExpression(_)
                | SpkiError::MalformedExpression(_)
                | SpkiError::Sexp(_)
        )
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, SpkiError>;
