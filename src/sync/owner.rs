/// Owner id stored in a free lock.
pub const NO_OWNER: usize = 0;

/// Returns an id for the calling thread, never [`NO_OWNER`].
///
/// The id is the address of a thread-local, so two live threads never share one. A thread
/// started after another has exited may reuse its id; since a thread that exits while
/// holding a lock has already broken the protocol, that reuse is harmless here.
#[inline(always)]
pub fn current() -> usize {
    thread_local!(static OWNER_ID: u8 = const { 0 });
    OWNER_ID.with(|id| {
        let id: *const u8 = id;
        id as usize
    })
}
