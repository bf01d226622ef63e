//! Hash values.
//!
//! A [`Hash`] is a digest under a named algorithm, encoded as
//! `(hash ALGORITHM DIGEST)` with an optional `(uris URI...)` fourth
//! element naming places the hashed object can be fetched from. The URIs
//! are advisory: they take no part in equality, and the plain encoder
//! leaves them out.

use spki_sexp::Sexp;
use std::fmt;
use url::Url;

use crate::digest;
use crate::error::{Result, SpkiError};

#[derive(Clone)]
pub struct Hash {
    pub algorithm: String,
    pub digest: Vec<u8>,
    pub uris: Vec<Url>,
}

impl Hash {
    /// Wrap an existing digest value.
    pub fn new(algorithm: impl Into<String>, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest: digest.into(),
            uris: Vec::new(),
        }
    }

    /// Digest `data` under a registered algorithm.
    pub fn compute(algorithm: &str, data: &[u8]) -> Result<Self> {
        let digest = digest::registry()?.digest(algorithm, data)?;
        Ok(Self::new(algorithm, digest))
    }

    /// Digest the canonical bytes of an expression.
    pub fn of(algorithm: &str, sexp: &Sexp) -> Result<Self> {
        Self::compute(algorithm, &sexp.pack())
    }

    pub fn with_uris(mut self, uris: Vec<Url>) -> Self {
        self.uris = uris;
        self
    }

    /// Decode `(hash ALGORITHM DIGEST [URIS])`.
    pub fn decode(sexp: &Sexp) -> Result<Self> {
        let items = sexp
            .as_list()
            .ok_or_else(|| invalid("expected a list"))?;
        if !(3..=4).contains(&items.len()) {
            return Err(invalid(format!(
                "expected 3 or 4 elements, got {}",
                items.len()
            )));
        }
        if !items[0].is_atom("hash") {
            return Err(invalid("expected leading atom `hash`"));
        }
        let algorithm = items[1]
            .atom_bytes()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .ok_or_else(|| invalid("algorithm must be a text atom"))?;
        let value = items[2]
            .atom_bytes()
            .ok_or_else(|| invalid("digest must be an atom"))?;

        let alg = digest::registry()?
            .get(algorithm)
            .ok_or_else(|| SpkiError::UnknownAlgorithm(algorithm.to_string()))?;
        if value.len() != alg.output_size() {
            return Err(invalid(format!(
                "{} digest must be {} bytes, got {}",
                algorithm,
                alg.output_size(),
                value.len()
            )));
        }

        let uris = match items.get(3) {
            Some(uris) => decode_uris(uris)?,
            None => Vec::new(),
        };

        Ok(Self {
            algorithm: algorithm.to_string(),
            digest: value.to_vec(),
            uris,
        })
    }

    /// `(hash ALGORITHM DIGEST)`.
    pub fn encode(&self) -> Sexp {
        Sexp::list(vec![
            Sexp::atom("hash"),
            Sexp::atom(&self.algorithm),
            Sexp::atom(&self.digest),
        ])
    }

    /// `(hash ALGORITHM DIGEST (uris ...))`, or the plain form if there are
    /// no URIs.
    pub fn encode_with_uris(&self) -> Sexp {
        let mut items = vec![
            Sexp::atom("hash"),
            Sexp::atom(&self.algorithm),
            Sexp::atom(&self.digest),
        ];
        if !self.uris.is_empty() {
            items.push(encode_uris(&self.uris));
        }
        Sexp::list(items)
    }

    /// Canonical bytes of [`Hash::encode`].
    pub fn pack(&self) -> Vec<u8> {
        self.encode().pack()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

/// Algorithm and digest only; URIs are ignored.
impl PartialEq for Hash {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.digest == other.digest
    }
}

impl Eq for Hash {}

impl std::hash::Hash for Hash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(&self.algorithm, state);
        std::hash::Hash::hash(&self.digest, state);
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.encode(), f)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}:{})", self.algorithm, self.to_hex())
    }
}

/// Decode `(uris URI...)`; at least one URI is required.
pub fn decode_uris(sexp: &Sexp) -> Result<Vec<Url>> {
    let items = sexp
        .as_list()
        .filter(|items| items.len() >= 2 && items[0].is_atom("uris"))
        .ok_or_else(|| invalid("expected (uris URI...)"))?;
    items[1..]
        .iter()
        .map(|item| {
            let text = item
                .atom_bytes()
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .ok_or_else(|| invalid("uri must be a text atom"))?;
            Url::parse(text).map_err(|e| SpkiError::InvalidUri(format!("{}: {}", text, e)))
        })
        .collect()
}

pub fn encode_uris(uris: &[Url]) -> Sexp {
    let mut items = Vec::with_capacity(uris.len() + 1);
    items.push(Sexp::atom("uris"));
    items.extend(uris.iter().map(|uri| Sexp::atom(uri.as_str())));
    Sexp::list(items)
}

fn invalid(reason: impl Into<String>) -> SpkiError {
    SpkiError::InvalidHashExpression(reason.into())
}
