//! A freelist of evidence buffers for linkage verification.
//!
//! Verifying a linkage re-derives both of its evidences. The pool keeps
//! previously used [`LinkedEvidence`] values around so their proof and
//! contract allocations are reused. A rented buffer goes back to the pool when
//! its [`Rented`] guard drops.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::evidence::{LinkBase, LinkedEvidence};
use crate::linkage::Linkage;

/// Buffers kept when no capacity is given.
pub const DEFAULT_POOL_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct EvidencePool<B> {
    free: Mutex<Vec<LinkedEvidence<B>>>,
    capacity: usize,
}

impl<B> Default for EvidencePool<B> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl<B> EvidencePool<B> {
    /// A pool keeping at most `capacity` idle buffers.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Idle buffers currently held.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    /// Take a buffer, if one is idle.
    pub fn rent(&self) -> Rented<'_, B> {
        let item = self.lock().pop();
        Rented { pool: self, item }
    }

    // A panic while holding the lock leaves the freelist intact.
    fn lock(&self) -> MutexGuard<'_, Vec<LinkedEvidence<B>>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn give_back(&self, item: LinkedEvidence<B>) {
        let mut free = self.lock();
        if free.len() < self.capacity {
            free.push(item);
        }
    }
}

/// A rented buffer, returned to its pool on drop.
pub struct Rented<'a, B> {
    pool: &'a EvidencePool<B>,
    item: Option<LinkedEvidence<B>>,
}

impl<B: LinkBase> Rented<'_, B> {
    /// Load one side of `linkage` into the buffer.
    pub fn populate(&mut self, linkage: &Linkage<B>, is_primary: bool) -> &LinkedEvidence<B> {
        if let Some(existing) = self.item.as_mut() {
            linkage.fill_evidence(is_primary, existing);
        }
        self.item.get_or_insert_with(|| linkage.evidence(is_primary))
    }
}

impl<B> Drop for Rented<'_, B> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.give_back(item);
        }
    }
}
