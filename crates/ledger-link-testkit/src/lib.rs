//! # Ledger Link Testkit
//!
//! Testing utilities for Ledger Link.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Vectors**: Deterministic signed linkages with pinned digests
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Parties, proofs and co-signed evidence pairs
//!
//! ## Vectors
//!
//! ```rust
//! use ledger_link_testkit::vectors::{all_vectors, linkage_digest, linkage_from_vector};
//!
//! for vector in all_vectors() {
//!     let linkage = linkage_from_vector(&vector);
//!     println!("{}: {}", vector.name, linkage_digest(&linkage));
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ledger_link_testkit::generators::{fixture_from_params, SettlementParams};
//!
//! proptest! {
//!     #[test]
//!     fn pair_always_verifies(params: SettlementParams) {
//!         let fixture = fixture_from_params(&params);
//!         let (primary, _) = fixture.linkable_pair(params.point);
//!         prop_assert!(primary.validate_and_verify(params.merger_index_cap, &fixture.options()));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ledger_link_testkit::fixtures::SettlementFixture;
//!
//! let fixture = SettlementFixture::new();
//! let (primary, secondary) = fixture.linkable_pair(100);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, Party, SettlementFixture, FIXTURE_NOW};
pub use generators::{fixture_from_params, SettlementParams};
pub use vectors::{all_vectors, linkage_from_vector, verify_all_vectors, LinkageVector};
