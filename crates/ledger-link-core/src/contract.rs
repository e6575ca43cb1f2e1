//! Contract: a proof, or its one-way identifier, plus accounted amounts.
//!
//! A contract starts in proof form and may be compacted with
//! [`Contract::strip_proof`] for archival. Both forms produce the same
//! [`Contract::hash`], and evidences and linkages sign over
//! `(hash, partial, total)`, so their signatures survive compaction. The
//! proof itself can no longer be verified once stripped.

use serde::{Deserialize, Serialize};

use crate::canonical::{bytes, int, tags, Canonical, FieldWriter, DEFAULT_SIGNATURE_LEVEL, FULL_LEVEL};
use crate::codec::Codec;
use crate::config::ValidationOptions;
use crate::crypto::Identifier;
use crate::error::ValidationError;
use crate::proof::Proof;
use crate::value::Point;

/// Proof form or identifier form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractBody {
    Proof(Box<Proof>),
    Identifier(Identifier),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contract {
    pub body: ContractBody,
    pub partial: Point,
    pub total: Point,
}

mod keys {
    pub const HASH: u64 = 1;
    pub const PARTIAL: u64 = 2;
    pub const TOTAL: u64 = 3;
}

impl Contract {
    pub fn new(proof: Proof, partial: Point, total: Point) -> Self {
        Self {
            body: ContractBody::Proof(Box::new(proof)),
            partial,
            total,
        }
    }

    /// A contract accounting the whole value of `proof`.
    pub fn from_proof(proof: Proof) -> Self {
        let amount = proof.value().map(|v| v.point()).unwrap_or(Point::ZERO);
        Self::new(proof, amount, amount)
    }

    /// An already-compacted contract.
    pub fn from_identifier(identifier: Identifier, partial: Point, total: Point) -> Self {
        Self {
            body: ContractBody::Identifier(identifier),
            partial,
            total,
        }
    }

    pub fn proof(&self) -> Option<&Proof> {
        match &self.body {
            ContractBody::Proof(p) => Some(&**p),
            ContractBody::Identifier(_) => None,
        }
    }

    pub fn is_stripped(&self) -> bool {
        matches!(self.body, ContractBody::Identifier(_))
    }

    /// The content hash; identical for the proof and identifier forms.
    pub fn hash(&self) -> Identifier {
        match &self.body {
            ContractBody::Identifier(id) => *id,
            ContractBody::Proof(proof) => Identifier::hash_parts(&[
                proof.canonical_bytes(FULL_LEVEL).as_slice(),
                &self.partial.to_be_bytes()[..],
                &self.total.to_be_bytes()[..],
            ]),
        }
    }

    /// Replace the proof by its identifier. Not reversible.
    pub fn strip_proof(&self) -> Contract {
        match &self.body {
            ContractBody::Identifier(_) => self.clone(),
            ContractBody::Proof(_) => Self::from_identifier(self.hash(), self.partial, self.total),
        }
    }

    /// Amounts must be in range and the partial may not exceed the total.
    fn check_amounts(&self) -> Result<(), ValidationError> {
        if !self.partial.is_valid() || !self.total.is_valid() || self.partial > self.total {
            return Err(ValidationError::StructuralError(format!(
                "contract amounts {} / {}",
                self.partial, self.total
            )));
        }
        Ok(())
    }

    /// Check amounts and the proof's window; fails for stripped contracts.
    pub fn check(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.check_amounts()?;
        self.proof().ok_or(ValidationError::MissingProof)?.check(options)
    }

    pub fn check_and_verify(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.check_amounts()?;
        self.proof()
            .ok_or(ValidationError::MissingProof)?
            .check_and_verify(options)
    }

    pub fn validate_and_verify(&self, options: &ValidationOptions) -> bool {
        self.check_and_verify(options).is_ok()
    }
}

impl Canonical for Contract {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(tags::CONTRACT);
        w.put_with(keys::HASH, DEFAULT_SIGNATURE_LEVEL, || bytes(self.hash().as_bytes()));
        w.put(keys::PARTIAL, DEFAULT_SIGNATURE_LEVEL, int(self.partial.0));
        w.put(keys::TOTAL, DEFAULT_SIGNATURE_LEVEL, int(self.total.0));
    }
}

impl Codec for Contract {}
