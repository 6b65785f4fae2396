use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{lock_api::RawMutex as _, RawMutex};

use super::{owner, LockError, Mutex};

pub struct ErrorCheckMutex {
    raw: RawMutex,
    // Only the thread holding `raw` writes this field, so a thread that reads its own id
    // here is the one that wrote it and still holds `raw`.
    owner: AtomicUsize,
}

impl ErrorCheckMutex {
    pub const fn new() -> Self {
        Self {
            raw: RawMutex::INIT,
            owner: AtomicUsize::new(owner::NO_OWNER),
        }
    }

    /// Whether the calling thread holds this lock.
    pub fn is_held_by_current(&self) -> bool {
        self.owner.load(Ordering::Relaxed) == owner::current()
    }
}

impl Default for ErrorCheckMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ErrorCheckMutex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorCheckMutex")
            .field("locked", &self.raw.is_locked())
            .field("owner", &self.owner.load(Ordering::Relaxed))
            .finish()
    }
}

impl Mutex for ErrorCheckMutex {
    fn acquire(&self) -> Result<(), LockError> {
        if self.is_held_by_current() {
            return Err(LockError::WouldDeadlock);
        }
        self.raw.lock();
        self.owner.store(owner::current(), Ordering::Relaxed);
        Ok(())
    }

    fn release(&self) -> Result<(), LockError> {
        if !self.is_held_by_current() {
            return Err(LockError::NotOwner);
        }
        self.owner.store(owner::NO_OWNER, Ordering::Relaxed);
        // SAFETY: the owner check above shows this thread locked `raw` and has not
        // unlocked it since.
        unsafe { self.raw.unlock() };
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}
