pub mod error_check;
pub mod owner;

use thiserror::Error;

/// Misuse of a lock, reported instead of corrupting its state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The caller already holds the lock it tried to acquire.
    #[error("Resource deadlock avoided")]
    WouldDeadlock,
    /// The caller tried to release a lock it does not hold.
    #[error("Operation not permitted")]
    NotOwner,
}

/// Error Checking Mutex without guards.
///
/// Acquire and release are separate calls so that a thread can hold several locks and give
/// them up in any order. The requirements are
/// 1. Mutual Exclusion - at most one thread holds the lock; others block in `acquire()` without spinning.
/// 2. Ownership - only the holder may `release()`, and the holder may not `acquire()` again.
///
/// Violating 2. returns a [`LockError`] and leaves the lock as it was.
pub trait Mutex {
    fn acquire(&self) -> Result<(), LockError>;
    fn release(&self) -> Result<(), LockError>;
    // Racy unless the caller knows no one else touches the lock
    fn is_locked(&self) -> bool;
}
