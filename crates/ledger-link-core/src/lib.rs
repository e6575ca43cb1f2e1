//! # Ledger Link Core
//!
//! Pure primitives for the Ledger Link settlement protocol: credits, values,
//! proofs, contracts, evidences and linkages.
//!
//! This crate contains no I/O, no storage, no networking and no logging. It
//! is pure computation over signed data structures.
//!
//! ## Key Types
//!
//! - [`Credit`] - An account namespace: an originator and up to three mergers
//! - [`Value`] - An owner holding a [`Point`] amount of a credit
//! - [`Proof`] - A signed, time-bounded assertion about a value or credit
//! - [`Contract`] - A proof, or its content hash, with accounted amounts
//! - [`ProofEvidence`], [`LinkedEvidence`] - Proofs co-signed by mergers
//! - [`Linkage`] - Two matching evidences signed by a linker
//! - [`OwnerToken`] - A session-bound proof of key ownership
//!
//! ## Signing levels
//!
//! Every signature covers the canonical CBOR encoding of its structure at a
//! signature level. See the [`canonical`] module.

pub mod canonical;
pub mod codec;
pub mod config;
pub mod contract;
pub mod credit;
pub mod crypto;
pub mod error;
pub mod evidence;
pub mod linkage;
pub mod owner_token;
pub mod pool;
pub mod proof;
pub mod time;
pub mod value;

pub use canonical::{
    Canonical, DEFAULT_SIGNATURE_LEVEL, EVIDENCE_BASE_LEVEL, FULL_LEVEL, LINKER_SIGNATURE_LEVEL,
    SIGN_DOMAIN,
};
pub use codec::{Codec, TaggedText};
pub use config::{ProtocolConfig, ValidationOptions};
pub use contract::{Contract, ContractBody};
pub use credit::{Credit, MAX_MERGERS};
pub use crypto::{Identifier, Keypair, PublicKey, Signature};
pub use error::{CoreError, LinkageError, SigningError, ValidationError};
pub use evidence::{
    ContractableEvidence, Evidence, LinkBase, LinkableEvidence, LinkedEvidence, MergerSignatures,
    ProofEvidence,
};
pub use linkage::{ContractLinkage, Linkage, ProofLinkage};
pub use owner_token::OwnerToken;
pub use pool::{EvidencePool, Rented, DEFAULT_POOL_CAPACITY};
pub use proof::{
    CredentialProof, PermittedSigner, Proof, ProofKind, ProofState, SignerProof, ValueProof,
    OWNER_SIGNER, ROOT_SIGNER,
};
pub use time::now_mics;
pub use value::{Point, Value};
