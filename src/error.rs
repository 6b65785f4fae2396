//! Error types for the alternation protocol.
//!
//! Every variant is fatal: once a lock operation misbehaves the ring may be in a state the
//! protocol cannot recover from, so callers abort instead of retrying.

use std::io;

use thiserror::Error;

use crate::sync::LockError;

/// Exit code for a successful run.
pub const SUCCESS: u8 = 0;

/// Exit code for failures that carry no OS error code.
pub const FAILURE: u8 = 1;

/// Why a worker refused to run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    #[error("no lock ring")]
    MissingRing,
    #[error("start index {0} is outside the ring")]
    InvalidOffset(usize),
    #[error("worker already seeded")]
    AlreadySeeded,
    #[error("worker already terminated")]
    Terminated,
}

#[derive(Error, Debug)]
pub enum BatonError {
    /// A worker thread could not be created.
    #[error("{context} : {source}")]
    Init {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// Double acquire or release of a lock the caller does not hold.
    #[error("{context} : lock {index} : {source}")]
    Ownership {
        context: &'static str,
        index: usize,
        #[source]
        source: LockError,
    },

    /// A worker was handed a missing ring or an invalid start index.
    #[error("{context} : {reason}")]
    Precondition {
        context: &'static str,
        reason: Precondition,
    },

    /// The worker thread panicked instead of reporting an outcome.
    #[error("{context} : worker thread could not be joined")]
    Join { context: &'static str },

    /// The ring was torn down while a lock was still held.
    #[error("destroy : lock {index} is still held")]
    Destroy { index: usize },
}

impl BatonError {
    /// Underlying OS error code, if the failure came from the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            BatonError::Init { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// Process exit code for this error: the OS error code where one fits, else [`FAILURE`].
    pub fn exit_code(&self) -> u8 {
        self.raw_os_error()
            .and_then(|code| u8::try_from(code).ok())
            .filter(|&code| code != SUCCESS)
            .unwrap_or(FAILURE)
    }
}

pub type Result<T> = std::result::Result<T, BatonError>;
