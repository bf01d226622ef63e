//! Sequences: ordered bundles of certificates, keys and signatures.
//!
//! ```text
//! (sequence (public-key ...) (cert ...) (signature ...))
//! ```
//!
//! By convention a signature covers the element immediately before it,
//! and a public key placed in the sequence lets later signatures name
//! their principal by hash alone.

use spki_sexp::Sexp;

use crate::cert::AuthCert;
use crate::error::{Result, SpkiError};
use crate::expr::tagged;
use crate::hash::Hash;
use crate::public_key::PublicKey;
use crate::signature::{KeyLookup, Signature};

#[derive(Debug, Clone)]
pub enum SequenceElement {
    Cert(AuthCert),
    Signature(Signature),
    PublicKey(PublicKey),
}

impl SequenceElement {
    pub fn encode(&self) -> Result<Sexp> {
        match self {
            SequenceElement::Cert(cert) => cert.encode(),
            SequenceElement::Signature(signature) => Ok(signature.encode()),
            SequenceElement::PublicKey(key) => Ok(key.encode()),
        }
    }

    pub fn decode(sexp: &Sexp, lookup: Option<&dyn KeyLookup>) -> Result<Self> {
        match sexp.head() {
            Some(b"cert") => AuthCert::decode(sexp).map(SequenceElement::Cert),
            Some(b"signature") => Signature::decode(sexp, lookup).map(SequenceElement::Signature),
            Some(b"public-key") => PublicKey::decode(sexp).map(SequenceElement::PublicKey),
            _ => Err(SpkiError::MalformedExpression(format!(
                "unknown sequence element {}",
                sexp
            ))),
        }
    }

    pub fn to_advanced(&self) -> Result<String> {
        self.encode().map(|sexp| sexp.to_string())
    }
}

impl From<AuthCert> for SequenceElement {
    fn from(cert: AuthCert) -> Self {
        SequenceElement::Cert(cert)
    }
}

impl From<Signature> for SequenceElement {
    fn from(signature: Signature) -> Self {
        SequenceElement::Signature(signature)
    }
}

impl From<PublicKey> for SequenceElement {
    fn from(key: PublicKey) -> Self {
        SequenceElement::PublicKey(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sequence {
    elements: Vec<SequenceElement>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: impl Into<SequenceElement>) {
        self.elements.push(element.into());
    }

    pub fn elements(&self) -> &[SequenceElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn encode(&self) -> Result<Sexp> {
        let mut items = Vec::with_capacity(self.elements.len() + 1);
        items.push(Sexp::atom("sequence"));
        for element in &self.elements {
            items.push(element.encode()?);
        }
        Ok(Sexp::list(items))
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        self.encode().map(|sexp| sexp.pack())
    }

    pub fn to_advanced(&self) -> Result<String> {
        self.encode().map(|sexp| sexp.to_string())
    }

    /// Decode a sequence.
    ///
    /// A signature whose principal is a hash is resolved against the
    /// public keys that precede it in the sequence first, then against
    /// `lookup`.
    pub fn decode(sexp: &Sexp, lookup: Option<&dyn KeyLookup>) -> Result<Self> {
        let items = tagged(sexp, "sequence").ok_or_else(|| {
            SpkiError::MalformedExpression("expected (sequence ELEMENT...)".into())
        })?;

        let mut keys: Vec<PublicKey> = Vec::new();
        let mut elements = Vec::with_capacity(items.len() - 1);
        for item in &items[1..] {
            let element = {
                let scoped = SequenceLookup {
                    keys: &keys,
                    fallback: lookup,
                };
                SequenceElement::decode(item, Some(&scoped))?
            };
            if let SequenceElement::PublicKey(key) = &element {
                keys.push(key.clone());
            }
            elements.push(element);
        }
        Ok(Self { elements })
    }
}

impl FromIterator<SequenceElement> for Sequence {
    fn from_iter<I: IntoIterator<Item = SequenceElement>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<SequenceElement>> for Sequence {
    fn from(elements: Vec<SequenceElement>) -> Self {
        Self { elements }
    }
}

impl IntoIterator for Sequence {
    type Item = SequenceElement;
    type IntoIter = std::vec::IntoIter<SequenceElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a SequenceElement;
    type IntoIter = std::slice::Iter<'a, SequenceElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Keys seen earlier in a sequence, then the caller's lookup.
struct SequenceLookup<'a> {
    keys: &'a [PublicKey],
    fallback: Option<&'a dyn KeyLookup>,
}

impl KeyLookup for SequenceLookup<'_> {
    fn lookup(&self, hash: &Hash) -> Option<PublicKey> {
        self.keys
            .iter()
            .find(|key| {
                key.hash_expr(&hash.algorithm)
                    .map_or(false, |theirs| theirs == *hash)
            })
            .cloned()
            .or_else(|| self.fallback.and_then(|fallback| fallback.lookup(hash)))
    }
}
