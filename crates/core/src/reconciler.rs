//! Write-through policy between the live countdown and the persisted
//! "time remaining" value.

use std::num::NonZeroU32;

/// Default number of ticks between periodic write-throughs.
pub const DEFAULT_PERSIST_EVERY: NonZeroU32 = match NonZeroU32::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

/// Decides when the live countdown value must be copied into the durable
/// `persisted_time_remaining` field.
///
/// - every `persist_every` ticks while counting (periodic write-through);
/// - immediately on pause or page hide (forced snapshot);
/// - immediately when the current question changes (rebase to the new limit).
///
/// A restored session seeds its countdown from the persisted value, never from
/// the question's full limit.
#[derive(Debug, Clone)]
pub struct TimeReconciler {
    persist_every: NonZeroU32,
    ticks_since_flush: u32,
}

impl Default for TimeReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSIST_EVERY)
    }
}

impl TimeReconciler {
    #[must_use]
    pub fn new(persist_every: NonZeroU32) -> Self {
        Self {
            persist_every,
            ticks_since_flush: 0,
        }
    }

    /// Value a restored countdown must start from.
    pub fn seed(&mut self, persisted: u32) -> u32 {
        self.ticks_since_flush = 0;
        persisted
    }

    /// New question: the persisted value becomes the question's full limit.
    pub fn rebase(&mut self, time_limit_secs: u32) -> u32 {
        self.seed(time_limit_secs)
    }

    /// Record one live tick. Returns the value to persist when a write-through is due.
    pub fn observe_tick(&mut self, remaining: u32) -> Option<u32> {
        self.ticks_since_flush = self.ticks_since_flush.saturating_add(1);
        if remaining == 0 || self.ticks_since_flush >= self.persist_every.get() {
            return Some(self.flush(remaining));
        }
        None
    }

    /// Unconditional snapshot, used on pause and page hide.
    pub fn force(&mut self, remaining: u32) -> u32 {
        self.flush(remaining)
    }

    fn flush(&mut self, remaining: u32) -> u32 {
        self.ticks_since_flush = 0;
        remaining
    }
}
