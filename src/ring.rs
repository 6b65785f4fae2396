//! Three error-checked locks addressed modulo 3.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use crate::error::{BatonError, Result};
use crate::sync::{error_check::ErrorCheckMutex, LockError, Mutex};

pub const RING_SIZE: usize = 3;

#[derive(Debug, Default)]
pub struct LockRing {
    locks: [ErrorCheckMutex; RING_SIZE],
    ops: AtomicUsize,
}

impl LockRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ring index `step` positions after `start`.
    pub fn position(start: usize, step: usize) -> usize {
        (start + step) % RING_SIZE
    }

    pub fn acquire(&self, index: usize) -> std::result::Result<(), LockError> {
        let index = index % RING_SIZE;
        self.ops.fetch_add(1, Ordering::Relaxed);
        trace!(index, "acquire");
        self.locks[index].acquire()
    }

    pub fn release(&self, index: usize) -> std::result::Result<(), LockError> {
        let index = index % RING_SIZE;
        self.ops.fetch_add(1, Ordering::Relaxed);
        trace!(index, "release");
        self.locks[index].release()
    }

    pub fn is_held(&self, index: usize) -> bool {
        self.locks[index % RING_SIZE].is_locked()
    }

    pub fn held_count(&self) -> usize {
        self.locks.iter().filter(|l| l.is_locked()).count()
    }

    /// Number of acquire and release calls made through the ring, failed ones included.
    pub fn lock_ops(&self) -> usize {
        self.ops.load(Ordering::Relaxed)
    }

    pub fn ensure_free(&self) -> Result<()> {
        match self.locks.iter().position(|l| l.is_locked()) {
            Some(index) => Err(BatonError::Destroy { index }),
            None => Ok(()),
        }
    }

    /// Tears the ring down. Every lock must be free.
    pub fn destroy(self) -> Result<()> {
        self.ensure_free()
    }
}
