//! Certificate subjects.

use spki_sexp::Sexp;

use crate::error::Result;
use crate::hash::Hash;
use crate::key::Key;
use crate::private_key::PrivateKey;
use crate::public_key::PublicKey;

/// Anything a certificate can be issued to.
#[derive(Debug, Clone)]
pub enum Subject {
    Key(Key),
    /// The hash of an object, such as a document or another certificate.
    Hash(Hash),
}

impl Subject {
    /// The expression placed in a certificate's `(subject ...)` term.
    ///
    /// Keys are named by their natural hash; hashes stand for themselves.
    pub fn subject(&self) -> Result<Sexp> {
        match self {
            Subject::Key(key) => key.subject(),
            Subject::Hash(hash) => Ok(hash.encode()),
        }
    }

    /// Decode the body of a `(subject ...)` term.
    ///
    /// Hash expressions become [`Subject::Hash`]; they may name a key or
    /// any other object, and nothing here can tell which.
    pub fn decode(sexp: &Sexp) -> Result<Self> {
        if sexp.is_list_of("hash") {
            return Hash::decode(sexp).map(Subject::Hash);
        }
        Key::decode(sexp).map(Subject::Key)
    }
}

impl From<Key> for Subject {
    fn from(key: Key) -> Self {
        Subject::Key(key)
    }
}

impl From<PublicKey> for Subject {
    fn from(key: PublicKey) -> Self {
        Subject::Key(Key::Public(key))
    }
}

impl From<PrivateKey> for Subject {
    fn from(key: PrivateKey) -> Self {
        Subject::Key(Key::Public(key.public_key()))
    }
}

impl From<Hash> for Subject {
    fn from(hash: Hash) -> Self {
        Subject::Hash(hash)
    }
}
