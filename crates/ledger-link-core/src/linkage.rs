//! Linkage: two matching evidences combined and signed by the linker.
//!
//! A linkage stores the shared `(linked_mics, base1, base2)` once, the three
//! merger signatures of each side, and the linker's signature. The linker
//! signs at `LINKER_SIGNATURE_LEVEL`, which covers all six merger signatures.
//! Each side's evidence can be re-derived with [`Linkage::evidence`].

use serde::{Deserialize, Serialize};

use crate::canonical::{
    int, signature, tags, Canonical, FieldWriter, DEFAULT_SIGNATURE_LEVEL, FULL_LEVEL,
    LINKER_SIGNATURE_LEVEL,
};
use crate::codec::{Codec, TaggedText};
use crate::config::ValidationOptions;
use crate::contract::Contract;
use crate::crypto::{Keypair, PublicKey, Signature};
use crate::error::{LinkageError, SigningError, ValidationError};
use crate::evidence::{Evidence, LinkBase, LinkedEvidence, MergerSignatures};
use crate::pool::EvidencePool;
use crate::proof::Proof;

mod keys {
    pub const LINKED_MICS: u64 = 1;
    pub const BASE1: u64 = 2;
    pub const BASE2: u64 = 3;
    pub const PRIMARY_SIGNATURES: u64 = 4;
    pub const SECONDARY_SIGNATURES: u64 = 5;
    pub const LINKER_SIGNATURE: u64 = 15;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Linkage<B> {
    pub linked_mics: i64,
    pub base1: B,
    pub base2: B,
    pub primary_signatures: MergerSignatures,
    pub secondary_signatures: MergerSignatures,
    pub linker_signature: Option<Signature>,
}

/// Linkage over two proofs.
pub type ProofLinkage = Linkage<Proof>;

/// Linkage over two contracts; survives compaction of its proofs.
pub type ContractLinkage = Linkage<Contract>;

impl<B: LinkBase> Linkage<B> {
    /// Combine a primary and a secondary evidence of the same link.
    ///
    /// Argument order does not matter. Both evidences must verify with
    /// `options.merger_index_cap` required merger signatures. The result is
    /// not yet signed by the linker.
    pub fn try_create(
        e1: &LinkedEvidence<B>,
        e2: &LinkedEvidence<B>,
        options: &ValidationOptions,
    ) -> Result<Self, LinkageError> {
        if e1.is_primary == e2.is_primary {
            return Err(LinkageError::PrimaryArrangement);
        }
        let (primary, secondary) = if e1.is_primary { (e1, e2) } else { (e2, e1) };

        if primary.linked_mics != secondary.linked_mics {
            return Err(LinkageError::LinkedMicsMismatch {
                primary: primary.linked_mics,
                secondary: secondary.linked_mics,
            });
        }
        if primary.base1 != secondary.base1 || primary.base2 != secondary.base2 {
            return Err(LinkageError::BaseMismatch);
        }

        let cap = options.merger_index_cap;
        primary
            .check_and_verify(cap, options)
            .map_err(|reason| LinkageError::InvalidEvidence {
                side: "primary",
                reason,
            })?;
        secondary
            .check_and_verify(cap, options)
            .map_err(|reason| LinkageError::InvalidEvidence {
                side: "secondary",
                reason,
            })?;

        Ok(Self {
            linked_mics: primary.linked_mics,
            base1: primary.base1.clone(),
            base2: primary.base2.clone(),
            primary_signatures: primary.merger_signatures.clone(),
            secondary_signatures: secondary.merger_signatures.clone(),
            linker_signature: None,
        })
    }

    /// The linker key both bases name.
    fn shared_linker_key(&self) -> Result<&PublicKey, ValidationError> {
        let first = self
            .base1
            .linker_public_key()
            .ok_or(ValidationError::MissingLinkerKey)?;
        let second = self
            .base2
            .linker_public_key()
            .ok_or(ValidationError::MissingLinkerKey)?;
        if first != second {
            return Err(ValidationError::LinkerMismatch);
        }
        Ok(first)
    }

    /// The linker key, if both bases agree on one.
    pub fn linker_public_key(&self) -> Option<&PublicKey> {
        self.shared_linker_key().ok()
    }

    /// The message the linker signs.
    pub fn linker_signing_bytes(&self) -> Vec<u8> {
        self.signing_bytes(LINKER_SIGNATURE_LEVEL)
    }

    pub fn set_linker_signature(&mut self, signature: Signature) {
        self.linker_signature = Some(signature);
    }

    /// Sign as the linker named by the bases.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<(), SigningError> {
        match self.linker_public_key() {
            Some(pk) if *pk == keypair.public_key() => {}
            _ => return Err(SigningError::KeyMismatch),
        }
        let signature = keypair.sign(&self.linker_signing_bytes());
        self.set_linker_signature(signature);
        Ok(())
    }

    pub fn merger_signatures(&self, is_primary: bool) -> &MergerSignatures {
        if is_primary {
            &self.primary_signatures
        } else {
            &self.secondary_signatures
        }
    }

    /// Re-derive one side's evidence.
    pub fn evidence(&self, is_primary: bool) -> LinkedEvidence<B> {
        LinkedEvidence {
            is_primary,
            linked_mics: self.linked_mics,
            base1: self.base1.clone(),
            base2: self.base2.clone(),
            merger_signatures: self.merger_signatures(is_primary).clone(),
        }
    }

    /// Overwrite `target` with one side's evidence, reusing its allocations.
    pub fn fill_evidence(&self, is_primary: bool, target: &mut LinkedEvidence<B>) {
        target.is_primary = is_primary;
        target.linked_mics = self.linked_mics;
        target.base1.clone_from(&self.base1);
        target.base2.clone_from(&self.base2);
        target
            .merger_signatures
            .clone_from(self.merger_signatures(is_primary));
    }

    /// Linker-key consistency and both bases.
    pub fn check(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.shared_linker_key()?;
        self.base1.check_base(options)?;
        self.base2.check_base(options)
    }

    fn check_linker_signature(&self) -> Result<(), ValidationError> {
        let linker = self.shared_linker_key()?;
        let signature = self
            .linker_signature
            .as_ref()
            .ok_or(ValidationError::MissingLinkerSignature)?;
        linker
            .verify(&self.linker_signing_bytes(), signature)
            .map_err(|_| ValidationError::SignatureFailed)
    }

    pub fn check_and_verify(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.check(options)?;
        for is_primary in [true, false] {
            self.evidence(is_primary)
                .check_except_proof(options.merger_index_cap)?;
        }
        self.check_linker_signature()
    }

    /// Like [`check_and_verify`](Self::check_and_verify), deriving evidences
    /// into pooled buffers.
    pub fn check_and_verify_with_pool(
        &self,
        options: &ValidationOptions,
        pool: &EvidencePool<B>,
    ) -> Result<(), ValidationError> {
        self.check(options)?;
        let mut rented = pool.rent();
        for is_primary in [true, false] {
            rented
                .populate(self, is_primary)
                .check_except_proof(options.merger_index_cap)?;
        }
        self.check_linker_signature()
    }

    pub fn validate(&self, options: &ValidationOptions) -> bool {
        self.check(options).is_ok()
    }

    pub fn validate_and_verify(&self, options: &ValidationOptions) -> bool {
        self.check_and_verify(options).is_ok()
    }

    pub fn validate_and_verify_with_pool(
        &self,
        options: &ValidationOptions,
        pool: &EvidencePool<B>,
    ) -> bool {
        self.check_and_verify_with_pool(options, pool).is_ok()
    }
}

impl<B: LinkBase> Canonical for Linkage<B> {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(tags::LINKAGE);
        w.put(keys::LINKED_MICS, DEFAULT_SIGNATURE_LEVEL, int(self.linked_mics));
        w.put_with(keys::BASE1, DEFAULT_SIGNATURE_LEVEL, || {
            self.base1.to_cbor(FULL_LEVEL)
        });
        w.put_with(keys::BASE2, DEFAULT_SIGNATURE_LEVEL, || {
            self.base2.to_cbor(FULL_LEVEL)
        });
        for (key, sigs) in [
            (keys::PRIMARY_SIGNATURES, &self.primary_signatures),
            (keys::SECONDARY_SIGNATURES, &self.secondary_signatures),
        ] {
            w.put_with(key, LINKER_SIGNATURE_LEVEL, || sigs.to_cbor());
        }
        w.put(
            keys::LINKER_SIGNATURE,
            FULL_LEVEL,
            signature(self.linker_signature.as_ref()),
        );
    }
}

impl<B: LinkBase> Codec for Linkage<B> {}

impl<B: LinkBase> TaggedText for Linkage<B> {
    const TAG: char = 'L';
}
