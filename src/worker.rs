//! One side of the alternation.
//!
//! A worker with start index `s` owns lock `s+2` between turns. A turn is
//!
//! 1. acquire `s` and emit
//! 2. release `s+2`, acquire `s+1`
//! 3. release `s`, acquire `s+2`
//! 4. release `s+1`
//!
//! Two workers whose start indices are one position apart hand the baton back and forth:
//! each release in a turn is the lock the counterpart is blocked on, so their emissions
//! interleave one for one. No other state takes part in the ordering.

use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::{BatonError, Precondition, Result};
use crate::ring::{LockRing, RING_SIZE};
use crate::sync::LockError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub const fn name(self) -> &'static str {
        match self {
            Role::Initiator => "initiator",
            Role::Responder => "responder",
        }
    }

    /// Start index for this role. The responder sits one position behind the initiator,
    /// so the initiator's seed lock is the responder's first acquire.
    pub const fn start(self) -> usize {
        match self {
            Role::Initiator => 0,
            Role::Responder => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    NotStarted,
    /// Holds its seed lock, waiting on the first acquire of turn 1.
    Seeding,
    Running,
    Draining,
    Terminated(Outcome),
}

#[derive(Debug)]
pub struct Worker {
    ring: Arc<LockRing>,
    role: Role,
    start: usize,
    turns: usize,
    completed: usize,
    state: WorkerState,
}

impl Worker {
    /// Checks the ring and start index. Performs no lock operations.
    pub fn new(ring: Option<Arc<LockRing>>, role: Role, start: usize, turns: usize) -> Result<Self> {
        let context = role.name();
        let ring = ring.ok_or(BatonError::Precondition {
            context,
            reason: Precondition::MissingRing,
        })?;
        if start >= RING_SIZE {
            return Err(BatonError::Precondition {
                context,
                reason: Precondition::InvalidOffset(start),
            });
        }
        Ok(Self {
            ring,
            role,
            start,
            turns,
            completed: 0,
            state: WorkerState::NotStarted,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Lock held between turns.
    pub fn seed_index(&self) -> usize {
        LockRing::position(self.start, 2)
    }

    /// Takes the seed lock. Must happen before the counterpart can reach this worker's
    /// seed position.
    pub fn seed(&mut self) -> Result<()> {
        if self.state != WorkerState::NotStarted {
            return Err(self.precondition(Precondition::AlreadySeeded));
        }
        self.acquire(self.seed_index())?;
        self.transition(WorkerState::Seeding);
        Ok(())
    }

    /// Runs one turn; `emit` gets the 1-based turn number while lock `s` is held.
    pub fn turn<F: FnMut(usize)>(&mut self, emit: &mut F) -> Result<()> {
        if matches!(self.state, WorkerState::Draining | WorkerState::Terminated(_)) {
            return Err(self.precondition(Precondition::Terminated));
        }
        let s = self.start;
        let next = LockRing::position(s, 1);
        let last = LockRing::position(s, 2);

        self.acquire(s)?;
        if self.state != WorkerState::Running {
            self.transition(WorkerState::Running);
        }
        let turn = self.completed + 1;
        emit(turn);
        self.release(last)?;
        self.acquire(next)?;
        self.release(s)?;
        self.acquire(last)?;
        self.release(next)?;

        self.completed = turn;
        Ok(())
    }

    /// Releases the seed lock, leaving this worker's part of the ring free.
    pub fn drain(&mut self) -> Result<()> {
        if matches!(self.state, WorkerState::Draining | WorkerState::Terminated(_)) {
            return Err(self.precondition(Precondition::Terminated));
        }
        self.transition(WorkerState::Draining);
        self.release(self.seed_index())?;
        self.transition(WorkerState::Terminated(Outcome::Ok));
        Ok(())
    }

    /// Runs the remaining turns and drains.
    pub fn run<F: FnMut(usize)>(&mut self, mut emit: F) -> Result<()> {
        while self.completed < self.turns {
            self.turn(&mut emit)?;
        }
        self.drain()
    }

    fn acquire(&mut self, index: usize) -> Result<()> {
        match self.ring.acquire(index) {
            Ok(()) => Ok(()),
            Err(source) => Err(self.fail(index, source)),
        }
    }

    fn release(&mut self, index: usize) -> Result<()> {
        match self.ring.release(index) {
            Ok(()) => Ok(()),
            Err(source) => Err(self.fail(index, source)),
        }
    }

    fn fail(&mut self, index: usize, source: LockError) -> BatonError {
        error!(role = self.role.name(), index, %source, turn = self.completed + 1, "lock operation failed");
        self.transition(WorkerState::Terminated(Outcome::Failed));
        BatonError::Ownership {
            context: self.role.name(),
            index,
            source,
        }
    }

    fn precondition(&self, reason: Precondition) -> BatonError {
        BatonError::Precondition {
            context: self.role.name(),
            reason,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        debug!(role = self.role.name(), from = ?self.state, to = ?next, completed = self.completed, "worker state");
        self.state = next;
    }
}

/// A worker running on its own thread.
#[derive(Debug)]
pub struct WorkerHandle {
    role: Role,
    thread: JoinHandle<()>,
    // Written by the worker only when it terminates abnormally
    outcome: Arc<Mutex<Option<BatonError>>>,
}

/// Starts a worker on a new thread and returns once it has taken its seed lock.
///
/// A worker that fails before seeding is joined here and its error returned, so a
/// returned handle always belongs to a worker holding its seed lock. Blocks for as long as the seed lock is held by someone else.
pub fn spawn<F>(
    ring: Option<Arc<LockRing>>,
    role: Role,
    start: usize,
    turns: usize,
    emit: F,
) -> Result<WorkerHandle>
where
    F: FnMut(usize) + Send + 'static,
{
    let outcome = Arc::new(Mutex::new(None));
    // Startup rendezvous only; turn order comes from the ring alone
    let ready = Arc::new(Barrier::new(2));
    let thread = thread::Builder::new()
        .name(role.name().to_string())
        .spawn({
            let outcome = outcome.clone();
            let ready = ready.clone();
            move || {
                let seeded = Worker::new(ring, role, start, turns).and_then(|mut w| {
                    w.seed()?;
                    Ok(w)
                });
                let mut worker = match seeded {
                    Ok(worker) => worker,
                    Err(err) => {
                        *outcome.lock() = Some(err);
                        ready.wait();
                        return;
                    }
                };
                ready.wait();
                if let Err(err) = worker.run(emit) {
                    *outcome.lock() = Some(err);
                }
            }
        })
        .map_err(|source| BatonError::Init {
            context: role.name(),
            source,
        })?;
    ready.wait();
    let early = outcome.lock().take();
    if let Some(err) = early {
        // Never seeded, so the thread is already on its way out
        if thread.join().is_err() {
            return Err(BatonError::Join {
                context: role.name(),
            });
        }
        return Err(err);
    }
    Ok(WorkerHandle {
        role,
        thread,
        outcome,
    })
}

impl WorkerHandle {
    pub fn role(&self) -> Role {
        self.role
    }

    /// Waits for the worker thread and returns its completion state.
    pub fn join(self) -> Result<()> {
        let context = self.role.name();
        if self.thread.join().is_err() {
            error!(role = context, "worker thread panicked");
            return Err(BatonError::Join { context });
        }
        match self.outcome.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
