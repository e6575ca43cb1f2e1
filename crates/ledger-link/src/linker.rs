//! The Linker: pairs matching evidences and signs the resulting linkage.
//!
//! Both parties of a transfer send their evidence to the linker named in
//! their proofs. Evidences can be linked directly with [`Linker::link`], or
//! submitted one at a time with [`Linker::submit`]; the first side of a link
//! waits in a pending table until its counterpart arrives or its TTL runs out.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ledger_link_core::pool::{EvidencePool, DEFAULT_POOL_CAPACITY};
use ledger_link_core::time::MICS_PER_MINUTE;
use ledger_link_core::{
    now_mics, Canonical, Codec, Evidence, Identifier, Keypair, LinkBase, LinkedEvidence, Linkage,
    ProtocolConfig, PublicKey, ValidationOptions, FULL_LEVEL, MAX_MERGERS,
};

use crate::error::{LinkerError, Result};

/// Configuration for the Linker.
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Protocol parameters used to validate proofs.
    pub protocol: ProtocolConfig,
    /// Merger signatures required on each evidence.
    pub merger_index_cap: usize,
    /// Idle evidence buffers kept for verification.
    pub pool_capacity: usize,
    /// How long an unmatched evidence stays pending.
    pub pending_ttl_mics: i64,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolConfig::default(),
            merger_index_cap: MAX_MERGERS,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            pending_ttl_mics: 10 * MICS_PER_MINUTE,
        }
    }
}

impl LinkerConfig {
    fn options_at(&self, now: i64) -> ValidationOptions {
        self.protocol
            .validation_options()
            .at(now)
            .with_merger_cap(self.merger_index_cap)
    }
}

/// Result of submitting a single evidence.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<B> {
    /// Waiting for the other side.
    Pending,
    /// The same evidence was already pending (idempotent).
    Duplicate,
    /// A different evidence for the same side is already pending; it is kept.
    Conflict,
    /// Both sides arrived; the signed linkage.
    Linked(Linkage<B>),
}

/// Identifies one link: the session time plus both bases.
type LinkKey = (i64, Identifier);

struct PendingEvidence<B> {
    evidence: LinkedEvidence<B>,
    received_mics: i64,
}

/// The main Linker struct.
pub struct Linker<B> {
    /// The key named as linker in the proofs this linker settles.
    keypair: Keypair,
    /// Configuration.
    config: LinkerConfig,
    /// Scratch evidences for linkage verification.
    pool: EvidencePool<B>,
    /// Evidences waiting for their counterpart.
    pending: Mutex<HashMap<LinkKey, PendingEvidence<B>>>,
}

impl<B: LinkBase> Linker<B> {
    /// Create a new linker.
    pub fn new(keypair: Keypair, config: LinkerConfig) -> Self {
        Self {
            pool: EvidencePool::new(config.pool_capacity),
            keypair,
            config,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Get the linker's public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Linking
    // ─────────────────────────────────────────────────────────────────────────

    /// Link a primary and a secondary evidence (in either order) and sign.
    pub fn link(&self, e1: &LinkedEvidence<B>, e2: &LinkedEvidence<B>) -> Result<Linkage<B>> {
        self.link_at(e1, e2, now_mics())
    }

    pub fn link_at(
        &self,
        e1: &LinkedEvidence<B>,
        e2: &LinkedEvidence<B>,
        now: i64,
    ) -> Result<Linkage<B>> {
        self.ensure_addressed(e1)?;
        self.ensure_addressed(e2)?;

        let mut linkage =
            Linkage::try_create(e1, e2, &self.config.options_at(now)).map_err(|e| {
                tracing::warn!(linked_mics = e1.linked_mics, error = %e, "rejected evidence pair");
                e
            })?;
        linkage.sign(&self.keypair)?;

        tracing::debug!(
            linked_mics = linkage.linked_mics,
            linker = %self.keypair.public_key(),
            "linked evidences"
        );
        Ok(linkage)
    }

    /// Both bases must name this linker.
    fn ensure_addressed(&self, evidence: &LinkedEvidence<B>) -> Result<()> {
        let me = self.keypair.public_key();
        for base in [&evidence.base1, &evidence.base2] {
            if base.linker_public_key() != Some(&me) {
                return Err(LinkerError::NotLinker);
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Fully verify a linkage, using the linker's evidence pool.
    pub fn verify(&self, linkage: &Linkage<B>) -> Result<()> {
        self.verify_at(linkage, now_mics())
    }

    pub fn verify_at(&self, linkage: &Linkage<B>, now: i64) -> Result<()> {
        linkage.check_and_verify_with_pool(&self.config.options_at(now), &self.pool)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────────

    /// Submit one side of a link. Links as soon as both sides are present.
    pub fn submit(&self, evidence: LinkedEvidence<B>) -> Result<SubmitOutcome<B>> {
        self.submit_at(evidence, now_mics())
    }

    /// Decode and submit an evidence received as bytes.
    pub fn submit_bytes(&self, bytes: &[u8]) -> Result<SubmitOutcome<B>> {
        self.submit_bytes_at(bytes, now_mics())
    }

    pub fn submit_bytes_at(&self, bytes: &[u8], now: i64) -> Result<SubmitOutcome<B>> {
        let evidence = LinkedEvidence::<B>::from_bytes(bytes)?;
        self.submit_at(evidence, now)
    }

    pub fn submit_at(&self, evidence: LinkedEvidence<B>, now: i64) -> Result<SubmitOutcome<B>> {
        self.ensure_addressed(&evidence)?;
        let options = self.config.options_at(now);
        if let Err(e) = evidence.check_and_verify(self.config.merger_index_cap, &options) {
            tracing::warn!(
                linked_mics = evidence.linked_mics,
                is_primary = evidence.is_primary,
                error = %e,
                "rejected evidence"
            );
            return Err(e.into());
        }

        let key = link_key(&evidence);
        let counterpart = {
            let mut pending = self.lock_pending();
            self.drop_expired(&mut pending, now);
            match pending.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(PendingEvidence {
                        evidence,
                        received_mics: now,
                    });
                    return Ok(SubmitOutcome::Pending);
                }
                Entry::Occupied(slot) => {
                    let waiting = &slot.get().evidence;
                    if waiting.is_primary == evidence.is_primary {
                        let outcome = if *waiting == evidence {
                            SubmitOutcome::Duplicate
                        } else {
                            SubmitOutcome::Conflict
                        };
                        return Ok(outcome);
                    }
                    slot.remove().evidence
                }
            }
        };

        self.link_at(&counterpart, &evidence, now)
            .map(SubmitOutcome::Linked)
    }

    /// Number of evidences waiting for a counterpart.
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Drop pending evidences older than the configured TTL.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(now_mics())
    }

    pub fn purge_expired_at(&self, now: i64) -> usize {
        let mut pending = self.lock_pending();
        self.drop_expired(&mut pending, now)
    }

    fn drop_expired(
        &self,
        pending: &mut HashMap<LinkKey, PendingEvidence<B>>,
        now: i64,
    ) -> usize {
        let ttl = self.config.pending_ttl_mics;
        let before = pending.len();
        pending.retain(|_, p| p.received_mics.saturating_add(ttl) > now);
        let purged = before - pending.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = pending.len(), "purged pending evidences");
        }
        purged
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<LinkKey, PendingEvidence<B>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn link_key<B: LinkBase>(evidence: &LinkedEvidence<B>) -> LinkKey {
    let id = Identifier::hash_parts(&[
        evidence.base1.canonical_bytes(FULL_LEVEL).as_slice(),
        evidence.base2.canonical_bytes(FULL_LEVEL).as_slice(),
    ]);
    (evidence.linked_mics, id)
}
