//! SDSI names.
//!
//! A [`Name`] is a principal key followed by zero or more identifiers in
//! that key's namespace:
//!
//! - no names: the key itself
//! - one name: a local name, `(name K alice)`
//! - several: an extended name, `(name K alice bob)`
//!
//! A missing principal stands for the issuer itself and encodes as the
//! atom `Self`.

use spki_sexp::Sexp;
use std::sync::Arc;

use crate::error::{Result, SpkiError};
use crate::expr::tagged;
use crate::key::Key;

const SELF: &str = "Self";

#[derive(Debug, Clone, Default)]
pub struct Name {
    pub principal: Option<Arc<Key>>,
    pub names: Vec<String>,
}

impl Name {
    pub fn new(principal: Option<Arc<Key>>, names: Vec<String>) -> Self {
        Self { principal, names }
    }

    /// The name denoting `key` itself.
    pub fn of_key(key: Arc<Key>) -> Self {
        Self::new(Some(key), Vec::new())
    }

    /// The self-referential issuer.
    pub fn self_issuer() -> Self {
        Self::default()
    }

    /// Extend this name by one identifier.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut names = self.names.clone();
        names.push(name.into());
        Self::new(self.principal.clone(), names)
    }

    pub fn is_principal(&self) -> bool {
        self.principal.is_some() && self.names.is_empty()
    }

    pub fn is_local(&self) -> bool {
        self.names.len() <= 1
    }

    /// The local part: `(name K a b c)` becomes `(name K a)`.
    pub fn local(&self) -> Self {
        if self.names.len() < 2 {
            return self.clone();
        }
        Self::new(self.principal.clone(), self.names[..1].to_vec())
    }

    /// True if the principals agree and the names agree wherever both
    /// have one.
    ///
    /// Only the overlap is compared, so `(name K a)` and `(name K a b c)`
    /// are each a prefix of the other. A name without a principal matches
    /// any principal.
    pub fn is_prefix(&self, other: &Name) -> bool {
        if let Some(mine) = &self.principal {
            match &other.principal {
                Some(theirs) if mine.equal(theirs) => {}
                _ => return false,
            }
        }
        self.names
            .iter()
            .zip(&other.names)
            .all(|(a, b)| a == b)
    }

    pub fn encode(&self) -> Result<Sexp> {
        let principal = match &self.principal {
            Some(key) => key.encode()?,
            None => Sexp::atom(SELF),
        };
        if self.names.is_empty() {
            return Ok(principal);
        }
        let mut items = Vec::with_capacity(self.names.len() + 2);
        items.push(Sexp::atom("name"));
        items.push(principal);
        items.extend(self.names.iter().map(|name| Sexp::atom(name)));
        Ok(Sexp::list(items))
    }

    /// Decode `Self`, a key or hash expression, or `(name PRINCIPAL n...)`.
    pub fn decode(sexp: &Sexp) -> Result<Self> {
        if let Some(items) = tagged(sexp, "name") {
            if items.len() < 3 {
                return Err(SpkiError::MalformedExpression(
                    "expected (name PRINCIPAL NAME...)".into(),
                ));
            }
            let principal = decode_principal(&items[1])?;
            let names = items[2..]
                .iter()
                .map(|item| {
                    item.atom_bytes()
                        .and_then(|bytes| std::str::from_utf8(bytes).ok())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            SpkiError::MalformedExpression(format!("name must be text, got {}", item))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self::new(principal, names));
        }
        Ok(Self::new(decode_principal(sexp)?, Vec::new()))
    }

    pub fn to_advanced(&self) -> Result<String> {
        self.encode().map(|sexp| sexp.to_string())
    }
}

fn decode_principal(sexp: &Sexp) -> Result<Option<Arc<Key>>> {
    if sexp.is_atom(SELF) {
        return Ok(None);
    }
    Key::decode(sexp).map(|key| Some(Arc::new(key)))
}

/// Principals compare with [`Key::equal`]; two absent principals are
/// equal.
impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        let principals = match (&self.principal, &other.principal) {
            (None, None) => true,
            (Some(a), Some(b)) => a.equal(b),
            _ => false,
        };
        principals && self.names == other.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Curve;
    use crate::private_key::PrivateKey;

    fn principal() -> Arc<Key> {
        crate::init();
        Arc::new(Key::Public(PrivateKey::random(Curve::P256).unwrap().public_key()))
    }

    fn name(key: &Arc<Key>, names: &[&str]) -> Name {
        Name::new(Some(key.clone()), names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_classification() {
        let k = principal();
        assert!(name(&k, &[]).is_principal());
        assert!(name(&k, &[]).is_local());
        assert!(!name(&k, &["a"]).is_principal());
        assert!(name(&k, &["a"]).is_local());
        assert!(!name(&k, &["a", "b"]).is_local());
        assert!(!Name::self_issuer().is_principal());
    }

    #[test]
    fn test_local() {
        let k = principal();
        assert_eq!(name(&k, &["a", "b", "c"]).local(), name(&k, &["a"]));
        assert_eq!(name(&k, &["a"]).local(), name(&k, &["a"]));
        assert_eq!(name(&k, &[]).local(), name(&k, &[]));
    }

    #[test]
    fn test_prefix_is_overlap_only() {
        let k = principal();
        let short = name(&k, &["a"]);
        let long = name(&k, &["a", "b", "c"]);
        assert!(short.is_prefix(&long));
        assert!(long.is_prefix(&short));
        assert!(!name(&k, &["x"]).is_prefix(&long));
    }

    #[test]
    fn test_prefix_requires_same_principal() {
        let k1 = principal();
        let k2 = principal();
        assert!(!name(&k1, &["a"]).is_prefix(&name(&k2, &["a", "b"])));
        assert!(!name(&k1, &["a"]).is_prefix(&Name::self_issuer().child("a")));
        assert!(Name::self_issuer().child("a").is_prefix(&name(&k2, &["a", "b"])));
    }

    #[test]
    fn test_equality() {
        let k = principal();
        assert_eq!(name(&k, &["a", "b"]), name(&k, &["a", "b"]));
        assert_ne!(name(&k, &["a"]), name(&k, &["a", "b"]));
        assert_ne!(name(&k, &["a"]), name(&principal(), &["a"]));
        assert_eq!(Name::self_issuer(), Name::self_issuer());
        assert_ne!(Name::self_issuer(), name(&k, &[]));

        // A hash of the key names the same principal.
        let hash = k.hash_expr("sha256").unwrap();
        let by_hash = Name::new(Some(Arc::new(Key::from(hash))), vec!["a".into()]);
        assert_eq!(by_hash, name(&k, &["a"]));
    }

    #[test]
    fn test_encode() {
        let k = principal();
        assert_eq!(Name::self_issuer().encode().unwrap(), Sexp::atom("Self"));
        assert_eq!(name(&k, &[]).encode().unwrap(), k.encode().unwrap());

        let encoded = name(&k, &["alice", "bob"]).encode().unwrap();
        let items = encoded.as_list().unwrap();
        assert!(items[0].is_atom("name"));
        assert_eq!(items[1], k.encode().unwrap());
        assert!(items[2].is_atom("alice"));
        assert!(items[3].is_atom("bob"));
    }

    #[test]
    fn test_decode_round_trip() {
        let k = principal();
        for original in [
            name(&k, &[]),
            name(&k, &["alice"]),
            name(&k, &["alice", "bob"]),
            Name::self_issuer(),
            Name::self_issuer().child("friends"),
        ] {
            let packed = original.encode().unwrap().pack();
            let decoded = Name::decode(&Sexp::parse(&packed).unwrap()).unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_decode_malformed() {
        crate::init();
        for text in ["(name Self)", "(name Self (a))", "(issuer Self)", "Other"] {
            let err = Name::decode(&Sexp::parse(text.as_bytes()).unwrap()).unwrap_err();
            assert!(err.is_malformed(), "{}: {:?}", text, err);
        }
    }
}
