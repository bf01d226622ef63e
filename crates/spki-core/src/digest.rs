//! The digest registry.
//!
//! Maps SPKI hash algorithm names (`sha224`, `sha256`, `sha384`, `sha512`)
//! to digest functions. The registry is process-wide, installed once by an
//! explicit call to [`init`] or [`install`], and read-only thereafter.

use once_cell::sync::OnceCell;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SpkiError};

/// A named digest function.
#[derive(Clone, Copy)]
pub struct DigestAlgorithm {
    name: &'static str,
    output_size: usize,
    compute: fn(&[u8]) -> Vec<u8>,
}

impl DigestAlgorithm {
    pub const SHA224: Self = Self {
        name: "sha224",
        output_size: 28,
        compute: sha224,
    };

    pub const SHA256: Self = Self {
        name: "sha256",
        output_size: 32,
        compute: sha256,
    };

    pub const SHA384: Self = Self {
        name: "sha384",
        output_size: 48,
        compute: sha384,
    };

    pub const SHA512: Self = Self {
        name: "sha512",
        output_size: 64,
        compute: sha512,
    };

    /// Every algorithm this crate knows how to compute.
    pub const ALL: [Self; 4] = [Self::SHA224, Self::SHA256, Self::SHA384, Self::SHA512];

    /// Look up a known algorithm by its SPKI name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.name == name)
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Digest length in bytes.
    pub const fn output_size(&self) -> usize {
        self.output_size
    }

    /// Compute the digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        tracing::trace!(algorithm = self.name, len = data.len(), "computing digest");
        (self.compute)(data)
    }
}

impl fmt::Debug for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DigestAlgorithm({})", self.name)
    }
}

/// A table of digest algorithms keyed by name.
///
/// Iteration is in name order, so scans over the registry are
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct DigestRegistry {
    algorithms: BTreeMap<&'static str, DigestAlgorithm>,
}

impl DigestRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The four SHA-2 algorithms.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for alg in DigestAlgorithm::ALL {
            registry.register(alg);
        }
        registry
    }

    /// A registry restricted to the named algorithms.
    pub fn with_algorithms<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::empty();
        for name in names {
            let name = name.as_ref();
            let alg = DigestAlgorithm::from_name(name)
                .ok_or_else(|| SpkiError::UnknownAlgorithm(name.to_string()))?;
            registry.register(alg);
        }
        Ok(registry)
    }

    pub fn register(&mut self, alg: DigestAlgorithm) {
        self.algorithms.insert(alg.name, alg);
    }

    pub fn get(&self, name: &str) -> Option<&DigestAlgorithm> {
        self.algorithms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }

    /// Registered algorithm names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.algorithms.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    /// Digest `data` under the named algorithm.
    pub fn digest(&self, name: &str, data: &[u8]) -> Result<Vec<u8>> {
        self.get(name)
            .map(|alg| alg.digest(data))
            .ok_or_else(|| SpkiError::UnknownAlgorithm(name.to_string()))
    }
}

fn sha224(data: &[u8]) -> Vec<u8> {
    Sha224::digest(data).to_vec()
}

fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

fn sha384(data: &[u8]) -> Vec<u8> {
    Sha384::digest(data).to_vec()
}

fn sha512(data: &[u8]) -> Vec<u8> {
    Sha512::digest(data).to_vec()
}

static REGISTRY: OnceCell<DigestRegistry> = OnceCell::new();

/// Install the standard registry if none is installed yet.
///
/// Idempotent; returns whichever registry ends up installed.
pub fn init() -> &'static DigestRegistry {
    REGISTRY.get_or_init(DigestRegistry::standard)
}

/// Install a custom registry.
///
/// The first installation wins. If a registry is already installed, the
/// rejected one is handed back alongside the installed one.
pub fn install(
    registry: DigestRegistry,
) -> std::result::Result<&'static DigestRegistry, (&'static DigestRegistry, DigestRegistry)> {
    REGISTRY.try_insert(registry)
}

/// The installed registry.
pub fn registry() -> Result<&'static DigestRegistry> {
    REGISTRY.get().ok_or(SpkiError::RegistryUninitialized)
}

/// True if `name` is a registered algorithm.
pub fn valid_hash(name: &str) -> bool {
    registry().map(|r| r.contains(name)).unwrap_or(false)
}
