//! The S-expression value type.
//!
//! An S-expression is either an atom (an octet string with an optional
//! display hint) or a list of S-expressions.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

use crate::canonical;
use crate::error::SexpError;
use crate::parse;

/// An octet-string atom.
///
/// The display hint, when present, is advisory and travels with the atom
/// through both encodings.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub hint: Option<Vec<u8>>,
    pub value: Vec<u8>,
}

impl Atom {
    /// Create an atom without a display hint.
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            hint: None,
            value: value.into(),
        }
    }

    /// Create an atom carrying a display hint.
    pub fn hinted(hint: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            hint: Some(hint.into()),
            value: value.into(),
        }
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    /// Interpret the value as UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

/// An S-expression.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Sexp {
    Atom(Atom),
    List(Vec<Sexp>),
}

impl Sexp {
    /// Create an unhinted atom.
    pub fn atom(value: impl AsRef<[u8]>) -> Self {
        Sexp::Atom(Atom::new(value.as_ref()))
    }

    /// Create an atom with a display hint.
    pub fn hinted(hint: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Self {
        Sexp::Atom(Atom::hinted(hint.as_ref(), value.as_ref()))
    }

    /// Create a list.
    pub fn list(items: Vec<Sexp>) -> Self {
        Sexp::List(items)
    }

    /// Parse a single S-expression from canonical or advanced bytes.
    ///
    /// Trailing whitespace is allowed; anything else after the expression
    /// is an error.
    pub fn parse(input: &[u8]) -> Result<Self, SexpError> {
        parse::parse(input)
    }

    /// Canonical bytes of this expression.
    pub fn pack(&self) -> Vec<u8> {
        canonical::pack(self)
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Sexp::Atom(atom) => Some(atom),
            Sexp::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::List(items) => Some(items),
            Sexp::Atom(_) => None,
        }
    }

    /// The value of an unhinted atom.
    pub fn atom_bytes(&self) -> Option<&[u8]> {
        match self {
            Sexp::Atom(Atom { hint: None, value }) => Some(value),
            _ => None,
        }
    }

    /// True if this is an unhinted atom whose value is `name`.
    pub fn is_atom(&self, name: &str) -> bool {
        self.atom_bytes() == Some(name.as_bytes())
    }

    /// The leading atom of a list, e.g. `hash` for `(hash sha256 ...)`.
    pub fn head(&self) -> Option<&[u8]> {
        self.as_list()?.first()?.atom_bytes()
    }

    /// True if this is a list whose leading atom is `name`.
    pub fn is_list_of(&self, name: &str) -> bool {
        self.head() == Some(name.as_bytes())
    }
}

impl From<Atom> for Sexp {
    fn from(atom: Atom) -> Self {
        Sexp::Atom(atom)
    }
}

impl From<Vec<Sexp>> for Sexp {
    fn from(items: Vec<Sexp>) -> Self {
        Sexp::List(items)
    }
}

/// Bytes allowed in a token, besides ASCII alphanumerics.
const TOKEN_PUNCTUATION: &[u8] = b"-./_:*+=";

pub(crate) fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || TOKEN_PUNCTUATION.contains(&b)
}

fn is_token(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(first) if !first.is_ascii_digit() => bytes.iter().all(|b| is_token_byte(*b)),
        _ => false,
    }
}

fn write_octets(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    if is_token(bytes) {
        // Token bytes are ASCII by construction.
        return f.write_str(&String::from_utf8_lossy(bytes));
    }
    if bytes.iter().all(|b| (0x20..0x7f).contains(b)) {
        f.write_str("\"")?;
        for &b in bytes {
            match b {
                b'"' => f.write_str("\\\"")?,
                b'\\' => f.write_str("\\\\")?,
                _ => write!(f, "{}", b as char)?,
            }
        }
        return f.write_str("\"");
    }
    write!(f, "|{}|", STANDARD.encode(bytes))
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(hint) = &self.hint {
            f.write_str("[")?;
            write_octets(f, hint)?;
            f.write_str("]")?;
        }
        write_octets(f, &self.value)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The advanced (human-readable) rendering.
impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(atom) => fmt::Display::fmt(atom, f),
            Sexp::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sexp({})", self)
    }
}
