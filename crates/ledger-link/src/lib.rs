//! # Ledger Link
//!
//! The linker service for the Ledger Link settlement protocol.
//!
//! ## Overview
//!
//! A transfer between two credits is settled in three signed stages:
//!
//! - **Proof**: the owner signs a time-bounded assertion about a value
//! - **Evidence**: each credit's mergers co-sign their side of the link
//! - **Linkage**: the linker checks both sides and signs the pair
//!
//! This crate provides the [`Linker`], which holds the linker key, pairs
//! evidences as they arrive and verifies finished linkages.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledger_link::{Linker, LinkerConfig, SubmitOutcome};
//! use ledger_link::core::{Keypair, LinkableEvidence};
//!
//! fn settle(primary: LinkableEvidence, secondary: LinkableEvidence) {
//!     let linker = Linker::new(Keypair::generate(), LinkerConfig::default());
//!
//!     // Evidences may arrive independently, in either order
//!     assert!(matches!(linker.submit(primary).unwrap(), SubmitOutcome::Pending));
//!     if let SubmitOutcome::Linked(linkage) = linker.submit(secondary).unwrap() {
//!         linker.verify(&linkage).unwrap();
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ledger_link::core` - Protocol primitives (Proof, Evidence, Linkage, etc.)

pub mod error;
pub mod linker;

pub use ledger_link_core as core;

pub use error::{LinkerError, Result};
pub use linker::{Linker, LinkerConfig, SubmitOutcome};

pub use ledger_link_core::{
    ContractLinkage, ContractableEvidence, Keypair, LinkableEvidence, Linkage, ProofLinkage,
    ProtocolConfig, PublicKey,
};
