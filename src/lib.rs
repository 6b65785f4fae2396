pub mod alternation;
pub mod config;
pub mod error;
pub mod ring;
pub mod sync;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use alternation::{alternate, Report};
pub use error::{BatonError, Result};
pub use ring::LockRing;
pub use worker::{spawn, Role, Worker, WorkerHandle, WorkerState};
