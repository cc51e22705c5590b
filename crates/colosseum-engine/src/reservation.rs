//! Quota reservations.
//!
//! Provisioning a template map happens off the engine actor and can take
//! a while, so the quota check and the registration of the new competition
//! are far apart. A [`Reservation`] holds one quota slot in between. The
//! engine counts outstanding reservations as live instances, so concurrent
//! requests cannot overshoot the quota.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colosseum_types::ArenaId;

/// Outstanding reservations of one arena.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReservationCounter(Arc<AtomicUsize>);

impl ReservationCounter {
    pub(crate) fn outstanding(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    /// Takes a slot. Only called on the engine actor, after the quota
    /// check, so check-then-take cannot race with another take.
    pub(crate) fn take(&self, arena: ArenaId) -> Reservation {
        self.0.fetch_add(1, Ordering::AcqRel);
        Reservation {
            arena,
            slots: Arc::clone(&self.0),
        }
    }
}

/// One held quota slot. Dropping it gives the slot back, whether the
/// request committed, gave up, or was cancelled mid-provisioning.
#[derive(Debug)]
pub struct Reservation {
    arena: ArenaId,
    slots: Arc<AtomicUsize>,
}

impl Reservation {
    pub fn arena(&self) -> ArenaId {
        self.arena
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.slots.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(arena = %self.arena, "reservation released");
    }
}
