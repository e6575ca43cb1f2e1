//! Evidences: a proof or contract plus up to three merger co-signatures.
//!
//! Merger `i` of the base proof's credit signs the evidence at level
//! `EVIDENCE_BASE_LEVEL + i`. Merger signatures are declared at
//! `FULL_LEVEL`, so each covers only the evidence body and never another
//! merger's signature; they can be collected in any order.
//!
//! Two shapes exist:
//! - [`ProofEvidence`]: a single proof.
//! - [`LinkedEvidence`]: one side of a bilateral link, carrying both bases.
//!   [`LinkableEvidence`] uses proofs, [`ContractableEvidence`] contracts.

use ciborium::value::Value as Cbor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::{
    int, signature, tags, Canonical, FieldWriter, EVIDENCE_BASE_LEVEL, FULL_LEVEL,
};
use crate::codec::Codec;
use crate::config::ValidationOptions;
use crate::contract::Contract;
use crate::credit::{Credit, MAX_MERGERS};
use crate::crypto::{Keypair, PublicKey, Signature};
use crate::error::{SigningError, ValidationError};
use crate::proof::{proof_cbor, Proof};

/// A base an evidence or linkage can be built over: a [`Proof`] or a [`Contract`].
pub trait LinkBase:
    Canonical + Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned
{
    /// The underlying proof, if still present.
    fn proof(&self) -> Option<&Proof>;

    /// Validate and verify the base itself.
    fn check_base(&self, options: &ValidationOptions) -> Result<(), ValidationError>;

    fn credit(&self) -> Option<&Credit> {
        self.proof().map(Proof::credit)
    }

    fn linker_public_key(&self) -> Option<&PublicKey> {
        self.proof().and_then(Proof::linker_public_key)
    }
}

impl LinkBase for Proof {
    fn proof(&self) -> Option<&Proof> {
        Some(self)
    }

    fn check_base(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.check_and_verify(options)
    }
}

impl LinkBase for Contract {
    fn proof(&self) -> Option<&Proof> {
        Contract::proof(self)
    }

    fn check_base(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.check_and_verify(options)
    }
}

/// Signature slots for the (up to) three mergers of a credit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergerSignatures(pub [Option<Signature>; MAX_MERGERS]);

impl MergerSignatures {
    pub fn get(&self, index: usize) -> Option<&Signature> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Number of filled slots.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|s| s.is_some()).count()
    }

    pub(crate) fn to_cbor(&self) -> Cbor {
        Cbor::Array(self.0.iter().map(|s| signature(s.as_ref())).collect())
    }
}

/// Behaviour shared by every evidence shape.
pub trait Evidence: Canonical {
    type Base: LinkBase;

    /// The base whose credit supplies the mergers.
    fn base(&self) -> &Self::Base;

    fn merger_signatures(&self) -> &MergerSignatures;

    fn merger_signatures_mut(&mut self) -> &mut MergerSignatures;

    /// Validate and verify every base this evidence carries.
    fn check_bases(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.base().check_base(options)
    }

    fn credit(&self) -> Option<&Credit> {
        self.base().credit()
    }

    /// The message merger `index` signs.
    fn merger_signing_bytes(&self, index: usize) -> Vec<u8> {
        self.signing_bytes(EVIDENCE_BASE_LEVEL + index as u32)
    }

    /// Attach a signature produced elsewhere by merger `index`.
    fn set_merger_signature(
        &mut self,
        index: usize,
        signature: Signature,
    ) -> Result<(), SigningError> {
        if index >= MAX_MERGERS {
            return Err(SigningError::MergerIndexOutOfRange(index));
        }
        self.merger_signatures_mut().0[index] = Some(signature);
        Ok(())
    }

    /// Co-sign as merger `index`; the keypair must be that merger.
    fn sign_merger(&mut self, index: usize, keypair: &Keypair) -> Result<(), SigningError> {
        if index >= MAX_MERGERS {
            return Err(SigningError::MergerIndexOutOfRange(index));
        }
        let expected = *self
            .credit()
            .ok_or(SigningError::MissingCredit)?
            .merger(index)
            .ok_or(SigningError::MergerIndexOutOfRange(index))?;
        if expected != keypair.public_key() {
            return Err(SigningError::KeyMismatch);
        }

        let signature = keypair.sign(&self.merger_signing_bytes(index));
        self.set_merger_signature(index, signature)
    }

    /// Check the first `min(cap, merger_count)` merger signatures only.
    fn check_except_proof(&self, merger_index_cap: usize) -> Result<(), ValidationError> {
        let credit = match self.base().proof() {
            Some(proof) => proof.credit(),
            None => return Err(ValidationError::MissingProof),
        };

        let required = merger_index_cap.min(credit.merger_count());
        for (i, merger) in credit.mergers().iter().take(required).enumerate() {
            let sig = self
                .merger_signatures()
                .get(i)
                .ok_or(ValidationError::MissingMergerSignature(i))?;
            merger
                .verify(&self.merger_signing_bytes(i), sig)
                .map_err(|_| ValidationError::MergerSignatureFailed(i))?;
        }
        Ok(())
    }

    fn validate_and_verify_except_proof(&self, merger_index_cap: usize) -> bool {
        self.check_except_proof(merger_index_cap).is_ok()
    }

    fn check_and_verify(
        &self,
        merger_index_cap: usize,
        options: &ValidationOptions,
    ) -> Result<(), ValidationError> {
        self.check_bases(options)?;
        self.check_except_proof(merger_index_cap)
    }

    fn validate_and_verify(&self, merger_index_cap: usize, options: &ValidationOptions) -> bool {
        self.check_and_verify(merger_index_cap, options).is_ok()
    }
}

mod keys {
    pub const IS_PRIMARY: u64 = 1;
    pub const LINKED_MICS: u64 = 2;
    pub const BASE1: u64 = 3;
    pub const BASE2: u64 = 4;
    pub const PROOF: u64 = 5;
    pub const MERGER_SIGNATURES: u64 = 15;
}

/// A single proof co-signed by its credit's mergers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofEvidence {
    pub proof: Proof,
    pub merger_signatures: MergerSignatures,
}

impl ProofEvidence {
    pub fn new(proof: Proof) -> Self {
        Self {
            proof,
            merger_signatures: MergerSignatures::default(),
        }
    }
}

impl Canonical for ProofEvidence {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(tags::PROOF_EVIDENCE);
        w.put_with(keys::PROOF, EVIDENCE_BASE_LEVEL, || proof_cbor(&self.proof));
        w.put_with(keys::MERGER_SIGNATURES, FULL_LEVEL, || {
            self.merger_signatures.to_cbor()
        });
    }
}

impl Evidence for ProofEvidence {
    type Base = Proof;

    fn base(&self) -> &Proof {
        &self.proof
    }

    fn merger_signatures(&self) -> &MergerSignatures {
        &self.merger_signatures
    }

    fn merger_signatures_mut(&mut self) -> &mut MergerSignatures {
        &mut self.merger_signatures
    }
}

impl Codec for ProofEvidence {}

/// One side of a bilateral link.
///
/// Both parties hold the same `base1`, `base2` and `linked_mics`; the primary
/// side's mergers come from `base1`'s credit, the secondary side's from
/// `base2`'s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkedEvidence<B> {
    pub is_primary: bool,
    pub linked_mics: i64,
    pub base1: B,
    pub base2: B,
    pub merger_signatures: MergerSignatures,
}

/// Evidence over two proofs (first protocol generation).
pub type LinkableEvidence = LinkedEvidence<Proof>;

/// Evidence over two contracts (compactable generation).
pub type ContractableEvidence = LinkedEvidence<Contract>;

impl<B: LinkBase> LinkedEvidence<B> {
    pub fn new(is_primary: bool, linked_mics: i64, base1: B, base2: B) -> Self {
        Self {
            is_primary,
            linked_mics,
            base1,
            base2,
            merger_signatures: MergerSignatures::default(),
        }
    }
}

impl ContractableEvidence {
    /// Wrap both proofs in whole-value contracts.
    pub fn from_proofs(is_primary: bool, linked_mics: i64, proof1: Proof, proof2: Proof) -> Self {
        Self::new(
            is_primary,
            linked_mics,
            Contract::from_proof(proof1),
            Contract::from_proof(proof2),
        )
    }
}

impl<B: LinkBase> Canonical for LinkedEvidence<B> {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(tags::LINKED_EVIDENCE);
        w.put(keys::IS_PRIMARY, EVIDENCE_BASE_LEVEL, Cbor::Bool(self.is_primary));
        w.put(keys::LINKED_MICS, EVIDENCE_BASE_LEVEL, int(self.linked_mics));
        w.put_with(keys::BASE1, EVIDENCE_BASE_LEVEL, || self.base1.to_cbor(FULL_LEVEL));
        w.put_with(keys::BASE2, EVIDENCE_BASE_LEVEL, || self.base2.to_cbor(FULL_LEVEL));
        w.put_with(keys::MERGER_SIGNATURES, FULL_LEVEL, || {
            self.merger_signatures.to_cbor()
        });
    }
}

impl<B: LinkBase> Evidence for LinkedEvidence<B> {
    type Base = B;

    fn base(&self) -> &B {
        if self.is_primary {
            &self.base1
        } else {
            &self.base2
        }
    }

    fn merger_signatures(&self) -> &MergerSignatures {
        &self.merger_signatures
    }

    fn merger_signatures_mut(&mut self) -> &mut MergerSignatures {
        &mut self.merger_signatures
    }

    fn check_bases(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.base1.check_base(options)?;
        self.base2.check_base(options)
    }
}

impl<B: LinkBase> Codec for LinkedEvidence<B> {}
