use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingResume {
    generation: u64,
    due: Instant,
}

/// Delayed resumes owed to the engine, one per fatal network error. Nothing
/// is spawned here: the session awaits `next_due` alongside its event channel
/// and claims entries once their deadline has passed, so scheduling works
/// from synchronous callers too.
#[derive(Debug, Default)]
pub struct RecoveryTimer {
    pending: Vec<PendingResume>,
}

impl RecoveryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resume due `delay` from now. Earlier entries stay scheduled.
    pub fn schedule(&mut self, delay: Duration, generation: u64) -> Instant {
        self.schedule_at(Instant::now() + delay, generation)
    }

    pub fn schedule_at(&mut self, due: Instant, generation: u64) -> Instant {
        // Keep the list sorted by deadline; equal deadlines fire in schedule order.
        let index = self.pending.partition_point(|pending| pending.due <= due);
        self.pending.insert(index, PendingResume { generation, due });
        due
    }

    /// Drops every outstanding resume. Returns true if any was pending.
    pub fn cancel(&mut self) -> bool {
        let had_pending = !self.pending.is_empty();
        self.pending.clear();
        had_pending
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.first().map(|pending| pending.due)
    }

    /// Removes the earliest resume whose deadline is at or before `now` and
    /// returns the attempt generation it was scheduled for.
    pub fn claim_due(&mut self, now: Instant) -> Option<u64> {
        match self.pending.first() {
            Some(pending) if pending.due <= now => Some(self.pending.remove(0).generation),
            _ => None,
        }
    }
}
