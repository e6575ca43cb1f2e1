//! Error types for the linker service.

use ledger_link_core::{CoreError, LinkageError, SigningError, ValidationError};
use thiserror::Error;

/// Errors that can occur during linker operations.
#[derive(Debug, Error)]
pub enum LinkerError {
    /// Evidence or linkage failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The two evidences do not form a link.
    #[error("linkage error: {0}")]
    Linkage(#[from] LinkageError),

    /// The linker could not sign.
    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    /// Malformed bytes or text.
    #[error("decoding error: {0}")]
    Core(#[from] CoreError),

    /// The evidence names a different linker.
    #[error("evidence is addressed to another linker")]
    NotLinker,
}

/// Result type for linker operations.
pub type Result<T> = std::result::Result<T, LinkerError>;
