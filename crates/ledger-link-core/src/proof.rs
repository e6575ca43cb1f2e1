//! Proofs: signed, time-bounded assertions about a value or credit.
//!
//! A proof moves through `Unsigned -> Signed -> (Verified | Expired |
//! Invalid)`. Signing is two-phase: [`Proof::prepare_for_signing`] resolves
//! which principal the candidate key is and fixes the validity window, then
//! the signature over [`Proof::signing_bytes`] is attached with
//! [`Proof::set_signature`]. [`Proof::sign`] does both with a local keypair.
//!
//! Which principals may sign is declared per kind by [`PermittedSigner`]:
//!
//! | Kind | Permitted | Signature key |
//! |---|---|---|
//! | [`ValueProof`] | owner | `value.owner` |
//! | [`SignerProof`] | owner, merger, root | by `signer` slot |
//! | [`CredentialProof`] | merger | `credit.mergers[merger_index]` |

use ciborium::value::Value as Cbor;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

use crate::canonical::{
    int, key, signature, tags, uint, Canonical, FieldWriter, DEFAULT_SIGNATURE_LEVEL, FULL_LEVEL,
};
use crate::codec::{Codec, TaggedText};
use crate::config::{ProtocolConfig, ValidationOptions};
use crate::credit::Credit;
use crate::crypto::{Keypair, PublicKey, Signature};
use crate::error::{SigningError, ValidationError};
use crate::time::{now_mics, truncate_to_day};
use crate::value::Value;

/// Principal categories a proof kind accepts as signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermittedSigner(u8);

impl PermittedSigner {
    pub const OWNER: Self = Self(1);
    pub const MERGER: Self = Self(2);
    pub const LP_KEY: Self = Self(4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PermittedSigner {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// `SignerProof::signer` slot of the owner. Slots `1..=3` are mergers.
pub const OWNER_SIGNER: u8 = 0;

/// `SignerProof::signer` slot of the root key.
pub const ROOT_SIGNER: u8 = u8::MAX;

/// A value-bound proof signed by the value's owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueProof {
    pub value: Value,
    pub linker_public_key: PublicKey,
}

/// A value-bound proof signed by the owner, a merger, or the root key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignerProof {
    pub value: Value,
    /// `0` owner, `1..=merger_count` merger `signer - 1`, anything else root.
    pub signer: u8,
    pub linker_public_key: PublicKey,
}

/// A merger's attestation that `subject` belongs to `credit`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialProof {
    pub credit: Credit,
    pub subject: PublicKey,
    pub merger_index: u8,
}

/// The closed set of proof kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofKind {
    Value(ValueProof),
    Signer(SignerProof),
    Credential(CredentialProof),
}

mod keys {
    pub const SIGNED_MICS: u64 = 1;
    pub const EXPIRATION_MICS: u64 = 2;
    pub const VALUE: u64 = 3;
    pub const LINKER: u64 = 4;
    pub const SIGNER: u64 = 5;
    pub const CREDIT: u64 = 6;
    pub const SUBJECT: u64 = 7;
    pub const MERGER_INDEX: u64 = 8;
    pub const SIGNATURE: u64 = 15;
}

impl ProofKind {
    pub fn permitted_signer(&self) -> PermittedSigner {
        match self {
            ProofKind::Value(_) => PermittedSigner::OWNER,
            ProofKind::Signer(_) => {
                PermittedSigner::OWNER | PermittedSigner::MERGER | PermittedSigner::LP_KEY
            }
            ProofKind::Credential(_) => PermittedSigner::MERGER,
        }
    }

    /// Decide which principal `candidate` is and record it.
    fn resolve_signer(
        &mut self,
        candidate: &PublicKey,
        root: Option<&PublicKey>,
    ) -> Result<(), SigningError> {
        let permitted = self.permitted_signer();
        match self {
            ProofKind::Value(p) => {
                if p.value.owner() == candidate {
                    Ok(())
                } else {
                    Err(SigningError::SignerNotPermitted)
                }
            }
            ProofKind::Signer(p) => {
                if permitted.contains(PermittedSigner::OWNER) && p.value.owner() == candidate {
                    p.signer = OWNER_SIGNER;
                    return Ok(());
                }
                if permitted.contains(PermittedSigner::MERGER) {
                    if let Some(i) = p.value.credit().merger_index_of(candidate) {
                        p.signer = i as u8 + 1;
                        return Ok(());
                    }
                }
                if permitted.contains(PermittedSigner::LP_KEY) && root == Some(candidate) {
                    p.signer = ROOT_SIGNER;
                    return Ok(());
                }
                Err(SigningError::SignerNotPermitted)
            }
            ProofKind::Credential(p) => match p.credit.merger_index_of(candidate) {
                Some(i) => {
                    p.merger_index = i as u8;
                    Ok(())
                }
                None => Err(SigningError::SignerNotPermitted),
            },
        }
    }

    /// The key whose signature this proof must carry.
    pub fn signature_key(&self, root: Option<&PublicKey>) -> Option<PublicKey> {
        match self {
            ProofKind::Value(p) => Some(*p.value.owner()),
            ProofKind::Signer(p) => {
                let credit = p.value.credit();
                match p.signer {
                    OWNER_SIGNER => Some(*p.value.owner()),
                    s if (s as usize) <= credit.merger_count() => {
                        credit.merger(s as usize - 1).copied()
                    }
                    _ => root.copied(),
                }
            }
            ProofKind::Credential(p) => p.credit.merger(p.merger_index as usize).copied(),
        }
    }

    pub fn credit(&self) -> &Credit {
        match self {
            ProofKind::Value(p) => p.value.credit(),
            ProofKind::Signer(p) => p.value.credit(),
            ProofKind::Credential(p) => &p.credit,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ProofKind::Value(p) => Some(&p.value),
            ProofKind::Signer(p) => Some(&p.value),
            ProofKind::Credential(_) => None,
        }
    }

    pub fn linker_public_key(&self) -> Option<&PublicKey> {
        match self {
            ProofKind::Value(p) => Some(&p.linker_public_key),
            ProofKind::Signer(p) => Some(&p.linker_public_key),
            ProofKind::Credential(_) => None,
        }
    }

    fn tag(&self) -> u64 {
        match self {
            ProofKind::Value(_) => tags::VALUE_PROOF,
            ProofKind::Signer(_) => tags::SIGNER_PROOF,
            ProofKind::Credential(_) => tags::CREDENTIAL_PROOF,
        }
    }

    fn write_payload(&self, w: &mut FieldWriter) {
        const L: u32 = DEFAULT_SIGNATURE_LEVEL;
        match self {
            ProofKind::Value(p) => {
                w.put_with(keys::VALUE, L, || p.value.to_cbor(FULL_LEVEL));
                w.put(keys::LINKER, L, key(&p.linker_public_key));
            }
            ProofKind::Signer(p) => {
                w.put_with(keys::VALUE, L, || p.value.to_cbor(FULL_LEVEL));
                w.put(keys::LINKER, L, key(&p.linker_public_key));
                w.put(keys::SIGNER, L, uint(p.signer as u64));
            }
            ProofKind::Credential(p) => {
                w.put_with(keys::CREDIT, L, || p.credit.to_cbor(FULL_LEVEL));
                w.put(keys::SUBJECT, L, key(&p.subject));
                w.put(keys::MERGER_INDEX, L, uint(p.merger_index as u64));
            }
        }
    }
}

/// Lifecycle state of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofState {
    Unsigned,
    Signed,
    Verified,
    Expired,
    Invalid,
}

/// A signed, time-bounded assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proof {
    pub kind: ProofKind,
    pub signed_mics: i64,
    pub expiration_mics: i64,
    pub signature: Option<Signature>,
}

impl Proof {
    /// An unsigned proof of the given kind.
    pub fn new(kind: ProofKind) -> Self {
        Self {
            kind,
            signed_mics: 0,
            expiration_mics: 0,
            signature: None,
        }
    }

    /// An owner-signed proof over `value`, to be linked by `linker`.
    pub fn for_value(value: Value, linker: PublicKey) -> Self {
        Self::new(ProofKind::Value(ValueProof {
            value,
            linker_public_key: linker,
        }))
    }

    /// A proof over `value` whose signer is resolved at signing time.
    pub fn with_signer(value: Value, linker: PublicKey) -> Self {
        Self::new(ProofKind::Signer(SignerProof {
            value,
            signer: OWNER_SIGNER,
            linker_public_key: linker,
        }))
    }

    /// A merger credential for `subject` in `credit`.
    pub fn credential(credit: Credit, subject: PublicKey) -> Self {
        Self::new(ProofKind::Credential(CredentialProof {
            credit,
            subject,
            merger_index: 0,
        }))
    }

    pub fn permitted_signer(&self) -> PermittedSigner {
        self.kind.permitted_signer()
    }

    pub fn signature_key(&self, root: Option<&PublicKey>) -> Option<PublicKey> {
        self.kind.signature_key(root)
    }

    pub fn credit(&self) -> &Credit {
        self.kind.credit()
    }

    pub fn value(&self) -> Option<&Value> {
        self.kind.value()
    }

    pub fn linker_public_key(&self) -> Option<&PublicKey> {
        self.kind.linker_public_key()
    }

    /// Resolve `candidate` as signer and open a validity window at the current time.
    pub fn prepare_for_signing(
        &mut self,
        candidate: &PublicKey,
        requested_valid_mics: i64,
        config: &ProtocolConfig,
    ) -> Result<(), SigningError> {
        self.prepare_for_signing_at(candidate, requested_valid_mics, config, now_mics())
    }

    /// Like [`prepare_for_signing`](Self::prepare_for_signing) at a fixed instant.
    ///
    /// The window is `requested_valid_mics` clamped to `(0, max_valid_mics]`;
    /// a non-positive request takes the maximum. Windows longer than
    /// `truncate_expiration_mics` expire at the start of their last day.
    pub fn prepare_for_signing_at(
        &mut self,
        candidate: &PublicKey,
        requested_valid_mics: i64,
        config: &ProtocolConfig,
        now: i64,
    ) -> Result<(), SigningError> {
        self.kind
            .resolve_signer(candidate, config.root_public_key.as_ref())?;

        let window = if requested_valid_mics <= 0 {
            config.max_valid_mics
        } else {
            requested_valid_mics.min(config.max_valid_mics)
        };

        self.signed_mics = now;
        self.expiration_mics = now.saturating_add(window);
        if window > config.truncate_expiration_mics {
            let truncated = truncate_to_day(self.expiration_mics);
            if truncated > now {
                self.expiration_mics = truncated;
            }
        }
        self.signature = None;
        Ok(())
    }

    /// The message the signer signs.
    pub fn signing_bytes(&self) -> Vec<u8> {
        Canonical::signing_bytes(self, DEFAULT_SIGNATURE_LEVEL)
    }

    pub fn set_signature(&mut self, signature: Signature) {
        self.signature = Some(signature);
    }

    /// Prepare and sign with a local keypair.
    pub fn sign(
        &mut self,
        keypair: &Keypair,
        requested_valid_mics: i64,
        config: &ProtocolConfig,
    ) -> Result<(), SigningError> {
        self.sign_at(keypair, requested_valid_mics, config, now_mics())
    }

    pub fn sign_at(
        &mut self,
        keypair: &Keypair,
        requested_valid_mics: i64,
        config: &ProtocolConfig,
        now: i64,
    ) -> Result<(), SigningError> {
        self.prepare_for_signing_at(&keypair.public_key(), requested_valid_mics, config, now)?;
        let signature = keypair.sign(&self.signing_bytes());
        self.set_signature(signature);
        Ok(())
    }

    /// Check the validity window.
    pub fn check(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        let window = self.expiration_mics.saturating_sub(self.signed_mics);
        if window <= 0 || window > options.config.max_valid_mics {
            return Err(ValidationError::InvalidWindow {
                signed_mics: self.signed_mics,
                expiration_mics: self.expiration_mics,
            });
        }

        if !options.ignore_expiration {
            let now = options.now();
            let margin = options.config.time_margin_mics;
            if now < self.signed_mics.saturating_sub(margin) {
                return Err(ValidationError::NotYetValid {
                    now_mics: now,
                    signed_mics: self.signed_mics,
                });
            }
            if now > self.expiration_mics.saturating_add(margin) {
                return Err(ValidationError::Expired {
                    now_mics: now,
                    expiration_mics: self.expiration_mics,
                });
            }
        }

        Ok(())
    }

    /// Check the signature against the resolved signature key.
    pub fn check_signature(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        let signature = self.signature.as_ref().ok_or(ValidationError::Unsigned)?;
        let signer = self
            .signature_key(options.root_public_key())
            .ok_or(ValidationError::SignerUnresolved)?;
        signer
            .verify(&self.signing_bytes(), signature)
            .map_err(|_| ValidationError::SignatureFailed)
    }

    pub fn check_and_verify(&self, options: &ValidationOptions) -> Result<(), ValidationError> {
        self.check(options)?;
        self.check_signature(options)
    }

    pub fn validate(&self, options: &ValidationOptions) -> bool {
        self.check(options).is_ok()
    }

    pub fn validate_and_verify(&self, options: &ValidationOptions) -> bool {
        self.check_and_verify(options).is_ok()
    }

    /// `Unsigned` or `Signed`, without verifying anything.
    pub fn state(&self) -> ProofState {
        match self.signature {
            None => ProofState::Unsigned,
            Some(_) => ProofState::Signed,
        }
    }

    /// The terminal state this proof reaches under `options`.
    pub fn verify_state(&self, options: &ValidationOptions) -> ProofState {
        if self.signature.is_none() {
            return ProofState::Unsigned;
        }
        match self.check_and_verify(options) {
            Ok(()) => ProofState::Verified,
            Err(ValidationError::Expired { .. }) | Err(ValidationError::NotYetValid { .. }) => {
                ProofState::Expired
            }
            Err(_) => ProofState::Invalid,
        }
    }
}

impl Canonical for Proof {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(self.kind.tag());
        w.put(keys::SIGNED_MICS, DEFAULT_SIGNATURE_LEVEL, int(self.signed_mics));
        w.put(
            keys::EXPIRATION_MICS,
            DEFAULT_SIGNATURE_LEVEL,
            int(self.expiration_mics),
        );
        self.kind.write_payload(w);
        w.put(keys::SIGNATURE, FULL_LEVEL, signature(self.signature.as_ref()));
    }
}

impl Codec for Proof {}

impl TaggedText for Proof {
    const TAG: char = 'P';
}

/// Full canonical form, used when a proof is nested in larger structures.
pub(crate) fn proof_cbor(proof: &Proof) -> Cbor {
    proof.to_cbor(FULL_LEVEL)
}
