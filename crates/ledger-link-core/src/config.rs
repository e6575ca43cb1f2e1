//! Protocol configuration and validation options.

use crate::credit::MAX_MERGERS;
use crate::crypto::PublicKey;
use crate::time::{now_mics, MICS_PER_DAY, MICS_PER_SECOND};

/// Longest permitted proof validity window (one year).
pub const MAX_VALID_MICS: i64 = 365 * MICS_PER_DAY;

/// Windows longer than this have their expiration truncated to a day boundary.
pub const TRUNCATE_EXPIRATION_MICS: i64 = 10 * MICS_PER_DAY;

/// Tolerated clock skew when checking a proof's window.
pub const TIME_MARGIN_MICS: i64 = 10 * MICS_PER_SECOND;

/// Protocol-wide parameters shared by signers and verifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Longest permitted `expiration - signed`.
    pub max_valid_mics: i64,
    /// Threshold above which expirations are truncated to a day boundary.
    pub truncate_expiration_mics: i64,
    /// Clock skew tolerated on both ends of the window.
    pub time_margin_mics: i64,
    /// The network root key, accepted where a proof kind permits it.
    pub root_public_key: Option<PublicKey>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_valid_mics: MAX_VALID_MICS,
            truncate_expiration_mics: TRUNCATE_EXPIRATION_MICS,
            time_margin_mics: TIME_MARGIN_MICS,
            root_public_key: None,
        }
    }
}

impl ProtocolConfig {
    /// Set the root key.
    pub fn with_root_key(mut self, root: PublicKey) -> Self {
        self.root_public_key = Some(root);
        self
    }

    /// Validation options evaluated against the live clock.
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions::new(*self)
    }
}

/// Options for `validate` / `validate_and_verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    pub config: ProtocolConfig,
    /// Evaluate at this instant instead of the live clock.
    pub now_mics: Option<i64>,
    /// Skip the `now` check (offline or archival validation).
    pub ignore_expiration: bool,
    /// Number of merger signatures required on evidences.
    pub merger_index_cap: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

impl ValidationOptions {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            now_mics: None,
            ignore_expiration: false,
            merger_index_cap: MAX_MERGERS,
        }
    }

    /// Evaluate at a fixed instant.
    pub fn at(mut self, now_mics: i64) -> Self {
        self.now_mics = Some(now_mics);
        self
    }

    pub fn ignoring_expiration(mut self) -> Self {
        self.ignore_expiration = true;
        self
    }

    pub fn with_merger_cap(mut self, cap: usize) -> Self {
        self.merger_index_cap = cap;
        self
    }

    /// The instant the window is checked against.
    pub fn now(&self) -> i64 {
        self.now_mics.unwrap_or_else(now_mics)
    }

    pub fn root_public_key(&self) -> Option<&PublicKey> {
        self.config.root_public_key.as_ref()
    }
}
