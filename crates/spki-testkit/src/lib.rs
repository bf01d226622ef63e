//! # SPKI Testkit
//!
//! Testing utilities for the SPKI crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: fixed keys and payloads with their expected hashes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic keys for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use spki_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, key_hash) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, key_hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use spki_testkit::generators::{cert_from_params, CertParams};
//!
//! proptest! {
//!     #[test]
//!     fn cert_bytes_are_deterministic(params: CertParams) {
//!         prop_assert_eq!(
//!             cert_from_params(&params).pack().unwrap(),
//!             cert_from_params(&params).pack().unwrap()
//!         );
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use spki_testkit::fixtures::TestFixture;
//!
//! let alice = TestFixture::with_scalar([0x0a; 32]);
//! let bob = TestFixture::with_scalar([0x0b; 32]);
//! let cert = alice.issue_to(&bob, "(tag (read))");
//! assert!(cert.delegate());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use generators::{cert_from_params, CertParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
