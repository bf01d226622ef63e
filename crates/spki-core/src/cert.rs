//! Authorization certificates.
//!
//! ```text
//! (cert (issuer ISSUER) (subject SUBJECT) [(delegate)] TAG [VALID])
//! ```
//!
//! A certificate that was decoded keeps the expression it was decoded
//! from and encodes back to exactly that expression, so its hash and any
//! signature over it stay stable even where the synthesized form would
//! differ (a subject given as a full key, say).

use spki_sexp::Sexp;

use crate::error::{Result, SpkiError};
use crate::expr::tagged;
use crate::hash::Hash;
use crate::name::Name;
use crate::subject::Subject;
use crate::valid::Valid;

#[derive(Debug, Clone)]
pub struct AuthCert {
    original: Option<Sexp>,
    issuer: Name,
    subject: Subject,
    delegate: bool,
    valid: Option<Valid>,
    tag: Sexp,
}

impl AuthCert {
    /// A non-delegable certificate with no validity bounds.
    pub fn new(issuer: Name, subject: Subject, tag: Sexp) -> Self {
        Self {
            original: None,
            issuer,
            subject,
            delegate: false,
            valid: None,
            tag,
        }
    }

    pub fn with_delegation(mut self, delegate: bool) -> Self {
        self.delegate = delegate;
        self.original = None;
        self
    }

    pub fn with_validity(mut self, valid: Valid) -> Self {
        self.valid = Some(valid);
        self.original = None;
        self
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn delegate(&self) -> bool {
        self.delegate
    }

    pub fn valid(&self) -> Option<&Valid> {
        self.valid.as_ref()
    }

    pub fn tag(&self) -> &Sexp {
        &self.tag
    }

    /// The expression this certificate was decoded from, if any.
    pub fn original(&self) -> Option<&Sexp> {
        self.original.as_ref()
    }

    pub fn encode(&self) -> Result<Sexp> {
        if let Some(original) = &self.original {
            return Ok(original.clone());
        }
        let mut items = vec![
            Sexp::atom("cert"),
            Sexp::list(vec![Sexp::atom("issuer"), self.issuer.encode()?]),
            Sexp::list(vec![Sexp::atom("subject"), self.subject.subject()?]),
        ];
        if self.delegate {
            items.push(Sexp::list(vec![Sexp::atom("delegate")]));
        }
        items.push(self.tag.clone());
        if let Some(valid) = self.valid.as_ref().and_then(Valid::encode) {
            items.push(valid);
        }
        Ok(Sexp::list(items))
    }

    pub fn decode(sexp: &Sexp) -> Result<Self> {
        let items = tagged(sexp, "cert")
            .filter(|items| (4..=6).contains(&items.len()))
            .ok_or_else(|| malformed("expected (cert (issuer I) (subject S) [(delegate)] TAG [VALID])"))?;

        let issuer = Name::decode(term_value("issuer", &items[1])?)?;
        let subject = Subject::decode(term_value("subject", &items[2])?)?;

        let mut rest = items[3..].iter().peekable();
        let delegate = rest.next_if(|item| is_delegate(item)).is_some();
        let tag = rest
            .next()
            .cloned()
            .ok_or_else(|| malformed("missing tag"))?;
        let valid = rest.next().map(Valid::decode).transpose()?;
        if let Some(extra) = rest.next() {
            return Err(malformed(format!("unexpected term {}", extra)));
        }

        Ok(Self {
            original: Some(sexp.clone()),
            issuer,
            subject,
            delegate,
            valid,
            tag,
        })
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        self.encode().map(|sexp| sexp.pack())
    }

    /// The hash of the certificate's canonical bytes.
    pub fn hash(&self, algorithm: &str) -> Result<Hash> {
        Hash::compute(algorithm, &self.pack()?)
    }

    pub fn to_advanced(&self) -> Result<String> {
        self.encode().map(|sexp| sexp.to_string())
    }
}

fn is_delegate(sexp: &Sexp) -> bool {
    matches!(sexp.as_list(), Some([only]) if only.is_atom("delegate"))
}

/// The value of a `(name VALUE)` term.
fn term_value<'a>(name: &str, sexp: &'a Sexp) -> Result<&'a Sexp> {
    match tagged(sexp, name) {
        Some([_, value]) => Ok(value),
        _ => Err(malformed(format!("expected ({} ...)", name))),
    }
}

fn malformed(reason: impl Into<String>) -> SpkiError {
    SpkiError::MalformedExpression(reason.into())
}
