//! Seeds the ring, runs both workers and tears the ring down.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{BatonError, Result};
use crate::ring::LockRing;
use crate::worker::{spawn, Role, Worker};

/// Summary of a completed alternation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub turns: usize,
    pub lock_ops: usize,
}

/// Runs `turns` turns on each side, the initiator on the calling thread.
///
/// The initiator emits first and the two sides alternate strictly. On error the call
/// returns at once; a responder blocked on the ring is left behind, so callers are
/// expected to abort the process.
pub fn alternate<I, R>(turns: usize, initiator_emit: I, responder_emit: R) -> Result<Report>
where
    I: FnMut(usize),
    R: FnMut(usize) + Send + 'static,
{
    alternate_on(
        Arc::new(LockRing::new()),
        Role::Responder.start(),
        turns,
        initiator_emit,
        responder_emit,
    )
}

/// [`alternate`] on a given ring, with the responder starting at `responder_start`.
///
/// The ring must be fresh and must not be shared with anyone else.
pub(crate) fn alternate_on<I, R>(
    ring: Arc<LockRing>,
    responder_start: usize,
    turns: usize,
    initiator_emit: I,
    responder_emit: R,
) -> Result<Report>
where
    I: FnMut(usize),
    R: FnMut(usize) + Send + 'static,
{
    info!(turns, "starting alternation");
    let mut initiator = Worker::new(Some(ring.clone()), Role::Initiator, Role::Initiator.start(), turns)?;
    // The initiator's seed lock is the responder's first acquire
    initiator.seed()?;

    let responder = spawn(
        Some(ring.clone()),
        Role::Responder,
        responder_start,
        turns,
        responder_emit,
    )?;

    initiator.run(initiator_emit)?;
    drop(initiator);
    responder.join()?;
    debug!(held = ring.held_count(), "workers joined");

    let lock_ops = ring.lock_ops();
    // Both workers are gone, so any other clone belongs to someone outside the protocol
    let ring = Arc::try_unwrap(ring).map_err(|_| BatonError::Join { context: "ring" })?;
    ring.destroy()?;
    info!(turns, lock_ops, "alternation complete");
    Ok(Report { turns, lock_ops })
}

#[cfg(test)]
mod tests {
    use crate::alternation::{alternate, alternate_on, Report};
    use crate::error::{BatonError, Precondition};
    use crate::ring::LockRing;
    use crate::test_support::init_test_logging;
    use crate::worker::Role;
    use parking_lot::Mutex;
    use rand::Rng;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<(Role, usize)>>>;

    fn recorder(log: &Log, role: Role) -> impl FnMut(usize) + Send + 'static {
        let log = log.clone();
        move |turn| log.lock().push((role, turn))
    }

    fn expected(turns: usize) -> Vec<(Role, usize)> {
        (1..=turns)
            .flat_map(|t| [(Role::Initiator, t), (Role::Responder, t)])
            .collect()
    }

    #[test]
    fn ten_turns_alternate() {
        init_test_logging();
        let log = Log::default();
        let report = alternate(10, recorder(&log, Role::Initiator), recorder(&log, Role::Responder)).unwrap();
        let log = log.lock();
        assert_eq!(log.len(), 20);
        assert_eq!(*log, expected(10));
        assert_eq!(log.first(), Some(&(Role::Initiator, 1)));
        assert_eq!(log.last(), Some(&(Role::Responder, 10)));
        assert_eq!(
            report,
            Report {
                turns: 10,
                lock_ops: 2 * (6 * 10 + 2)
            }
        );
    }

    #[test]
    fn zero_turns() {
        init_test_logging();
        let log = Log::default();
        let report = alternate(0, recorder(&log, Role::Initiator), recorder(&log, Role::Responder)).unwrap();
        assert!(log.lock().is_empty());
        // Seed and drain on each side
        assert_eq!(report.lock_ops, 4);
    }

    #[test]
    fn random_turns_alternate() {
        init_test_logging();
        let mut rng = rand::thread_rng();
        for _ in 0..5 {
            let turns = rng.gen_range(1..=500);
            let log = Log::default();
            let report =
                alternate(turns, recorder(&log, Role::Initiator), recorder(&log, Role::Responder)).unwrap();
            assert_eq!(*log.lock(), expected(turns));
            assert_eq!(report.lock_ops, 2 * (6 * turns + 2));
        }
    }

    #[test]
    fn alternates_under_jitter() {
        init_test_logging();
        let turns = rand::thread_rng().gen_range(1..=20);
        let log = Log::default();
        let mut initiator = recorder(&log, Role::Initiator);
        let mut responder = recorder(&log, Role::Responder);
        alternate(
            turns,
            move |t| {
                rand_timeout();
                initiator(t)
            },
            move |t| {
                rand_timeout();
                responder(t)
            },
        )
        .unwrap();
        assert_eq!(*log.lock(), expected(turns));
    }

    #[test]
    fn slow_responder_still_follows() {
        init_test_logging();
        // Responder sleeps inside its turn; the initiator must not run ahead
        let log = Log::default();
        let mut responder = recorder(&log, Role::Responder);
        alternate(5, recorder(&log, Role::Initiator), move |t| {
            std::thread::sleep(std::time::Duration::from_millis(20));
            responder(t)
        })
        .unwrap();
        assert_eq!(*log.lock(), expected(5));
    }

    #[test]
    fn emits_hold_no_overlap() {
        init_test_logging();
        // Each side's emission runs while its start lock is held; the two never overlap
        let busy = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let enter = |busy: Arc<std::sync::atomic::AtomicBool>| {
            move |_: usize| {
                assert!(!busy.swap(true, std::sync::atomic::Ordering::SeqCst));
                std::thread::sleep(std::time::Duration::from_millis(1));
                busy.store(false, std::sync::atomic::Ordering::SeqCst);
            }
        };
        alternate(20, enter(busy.clone()), enter(busy.clone())).unwrap();
    }

    #[test]
    fn responder_failure_aborts_before_any_turn() {
        init_test_logging();
        let ring = Arc::new(LockRing::new());
        let log = Log::default();
        let result = alternate_on(
            ring.clone(),
            7,
            10,
            recorder(&log, Role::Initiator),
            recorder(&log, Role::Responder),
        );
        match result {
            Err(BatonError::Precondition { context, reason }) => {
                assert_eq!(context, "responder");
                assert_eq!(reason, Precondition::InvalidOffset(7));
            }
            other => panic!("expected precondition error, got {other:?}"),
        }
        assert!(log.lock().is_empty());
        // Only the initiator's seed; its turns never started
        assert_eq!(ring.lock_ops(), 1);
        assert!(ring.is_held(2));
    }

    #[test]
    fn shared_ring_is_not_torn_down() {
        init_test_logging();
        let ring = Arc::new(LockRing::new());
        let log = Log::default();
        let result = alternate_on(
            ring.clone(),
            Role::Responder.start(),
            3,
            recorder(&log, Role::Initiator),
            recorder(&log, Role::Responder),
        );
        assert!(matches!(result, Err(BatonError::Join { context: "ring" })));
        // The run itself finished and left every lock free
        assert_eq!(*log.lock(), expected(3));
        assert_eq!(ring.held_count(), 0);
    }

    fn rand_timeout() {
        let mut rng = rand::thread_rng();
        let t = rng.gen_range(0..=5);
        std::thread::sleep(std::time::Duration::from_millis(t));
    }
}
