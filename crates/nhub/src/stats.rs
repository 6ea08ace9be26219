//! Per-hub counters.
//!
//! Cost per event: one `AtomicU64::fetch_add(1, Relaxed)`. Producers bump
//! `pokes_*` from arbitrary threads; everything else is bumped by the pump.

use core::sync::atomic::{AtomicU64, Ordering};
use std::fmt;

#[derive(Debug, Default)]
pub(crate) struct HubStats {
    pub(crate) pokes_delivered: AtomicU64,
    pub(crate) pokes_coalesced: AtomicU64,
    pub(crate) overflowed: AtomicU64,
    pub(crate) dispatched: AtomicU64,
    pub(crate) stale_keys: AtomicU64,
    pub(crate) spurious: AtomicU64,
    pub(crate) callback_failures: AtomicU64,
    pub(crate) interrupts: AtomicU64,
}

#[inline(always)]
pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl HubStats {
    pub(crate) fn snapshot(&self) -> HubStatsSnapshot {
        HubStatsSnapshot {
            pokes_delivered: self.pokes_delivered.load(Ordering::Relaxed),
            pokes_coalesced: self.pokes_coalesced.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            stale_keys: self.stale_keys.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            interrupts: self.interrupts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a hub's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStatsSnapshot {
    /// Pokes that won idle→queued and wrote a key
    pub pokes_delivered: u64,
    /// Pokes that found the notifier already queued
    pub pokes_coalesced: u64,
    /// Delivered pokes that found the channel full and went to the overflow queue
    pub overflowed: u64,
    /// Callbacks invoked (including ones that failed)
    pub dispatched: u64,
    /// Keys read for notifiers that no longer exist
    pub stale_keys: u64,
    /// Keys read for notifiers that were not queued
    pub spurious: u64,
    /// Callbacks that returned an error or panicked
    pub callback_failures: u64,
    /// `interrupt()` calls that queued a wakeup
    pub interrupts: u64,
}

impl fmt::Display for HubStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delivered={} coalesced={} overflowed={} dispatched={} stale={} spurious={} failed={} interrupts={}",
            self.pokes_delivered,
            self.pokes_coalesced,
            self.overflowed,
            self.dispatched,
            self.stale_keys,
            self.spurious,
            self.callback_failures,
            self.interrupts,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = HubStats::default();
        bump(&stats.pokes_delivered);
        bump(&stats.pokes_delivered);
        bump(&stats.stale_keys);

        let snap = stats.snapshot();
        assert_eq!(snap.pokes_delivered, 2);
        assert_eq!(snap.stale_keys, 1);
        assert_eq!(snap.dispatched, 0);
        assert_eq!(
            snap.to_string(),
            "delivered=2 coalesced=0 overflowed=0 dispatched=0 stale=1 spurious=0 failed=0 interrupts=0"
        );
    }
}
