//! Test fixtures and helpers.
//!
//! Common setup code for unit and integration tests. Keys are derived
//! from fixed scalars so runs are reproducible.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use spki_core::{AuthCert, Curve, Hash, Key, Name, PrivateKey, PublicKey, Signature, Valid};
use spki_sexp::Sexp;

/// A P-256 key pair for tests.
pub struct TestFixture {
    pub key: PrivateKey,
}

impl TestFixture {
    /// Create a fixture with a random key.
    pub fn new() -> Self {
        spki_core::init();
        Self {
            key: PrivateKey::random(Curve::P256).expect("random key generation"),
        }
    }

    /// Create with a deterministic key from a secret scalar.
    ///
    /// The scalar must be non-zero and below the P-256 group order.
    pub fn with_scalar(scalar: [u8; 32]) -> Self {
        spki_core::init();
        Self {
            key: PrivateKey::from_scalar(Curve::P256, &scalar).expect("scalar in range"),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// The key's sha256 hash.
    pub fn hash(&self) -> Hash {
        self.public_key()
            .natural_hash()
            .expect("digest registry initialized")
    }

    /// A name in this key's namespace.
    pub fn name(&self, names: &[&str]) -> Name {
        Name::new(
            Some(Arc::new(Key::Public(self.public_key()))),
            names.iter().map(|n| n.to_string()).collect(),
        )
    }

    pub fn sign(&self, payload: &Sexp) -> Signature {
        self.key.sign(payload).expect("signing")
    }

    /// A delegable certificate from this fixture to `subject`, with a tag
    /// given in advanced form.
    pub fn issue_to(&self, subject: &TestFixture, tag: &str) -> AuthCert {
        self.key
            .issue_auth_cert(subject.public_key(), parse(tag), None)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple fixtures with distinct deterministic keys.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut scalar = [0u8; 32];
            scalar[31] = (i + 1) as u8;
            scalar[0] = 0x10;
            TestFixture::with_scalar(scalar)
        })
        .collect()
}

/// Parse an expression written in advanced form.
pub fn parse(text: &str) -> Sexp {
    Sexp::parse(text.as_bytes()).expect("valid s-expression")
}

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid date")
}

/// A closed interval between two days.
pub fn interval(from: (i32, u32, u32), to: (i32, u32, u32)) -> Valid {
    Valid::new(Some(day(from.0, from.1, from.2)), Some(day(to.0, to.1, to.2)))
}
