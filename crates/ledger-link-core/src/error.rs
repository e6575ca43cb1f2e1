//! Error types for Ledger Link Core.

use thiserror::Error;

/// Structural errors: malformed keys, credits, values, text or bytes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("credit must have 1 to 3 mergers, got {0}")]
    InvalidMergerCount(usize),

    #[error("point {0} is outside the permitted range")]
    PointOutOfRange(i64),

    #[error("invalid text form: {0}")]
    InvalidText(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Reasons a proof, evidence or linkage fails validation or verification.
///
/// The boolean `validate*` APIs collapse these to `false`; the `check*`
/// APIs surface them for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("proof is not signed")]
    Unsigned,

    #[error("signature verification failed")]
    SignatureFailed,

    #[error("validity window is invalid: signed {signed_mics}, expires {expiration_mics}")]
    InvalidWindow {
        signed_mics: i64,
        expiration_mics: i64,
    },

    #[error("proof is not yet valid: now {now_mics}, signed {signed_mics}")]
    NotYetValid { now_mics: i64, signed_mics: i64 },

    #[error("proof expired: now {now_mics}, expired {expiration_mics}")]
    Expired { now_mics: i64, expiration_mics: i64 },

    #[error("signature key cannot be resolved")]
    SignerUnresolved,

    #[error("proof is not available (identifier-only contract)")]
    MissingProof,

    #[error("merger signature {0} is missing")]
    MissingMergerSignature(usize),

    #[error("merger signature {0} failed verification")]
    MergerSignatureFailed(usize),

    #[error("base proof carries no linker key")]
    MissingLinkerKey,

    #[error("bases name different linkers")]
    LinkerMismatch,

    #[error("linker signature is missing")]
    MissingLinkerSignature,

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => {
                ValidationError::SignatureFailed
            }
            other => ValidationError::StructuralError(other.to_string()),
        }
    }
}

/// Errors raised while preparing or attaching a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("key is not a permitted signer for this proof")]
    SignerNotPermitted,

    #[error("merger index {0} is out of range")]
    MergerIndexOutOfRange(usize),

    #[error("signing key does not match the expected signer")]
    KeyMismatch,

    #[error("no credit to resolve merger signers against")]
    MissingCredit,
}

/// Protocol-consistency errors from [`Linkage::try_create`](crate::Linkage::try_create).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkageError {
    #[error("exactly one evidence must be primary")]
    PrimaryArrangement,

    #[error("evidences attest to different base proofs")]
    BaseMismatch,

    #[error("linked mics differ: {primary} vs {secondary}")]
    LinkedMicsMismatch { primary: i64, secondary: i64 },

    #[error("{side} evidence is invalid: {reason}")]
    InvalidEvidence {
        side: &'static str,
        reason: ValidationError,
    },
}
