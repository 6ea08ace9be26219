//! Coalescing state for a notifier
//!
//! A notifier is either `Idle` or `Queued`. Producers move it
//! idle→queued and only the winner of that transition writes a key
//! into the channel. The dispatch loop moves it back queued→idle
//! just before running the callback.
//!
//! Both transitions are a single compare-exchange on one atomic word.
//! No lock is taken, so `try_queue` is safe to call from threads that
//! cannot block or take host locks (native callbacks, signal handlers).

use core::sync::atomic::{AtomicU32, Ordering};

/// State of a notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NotifyState {
    /// No wakeup outstanding
    Idle = 0,

    /// One wakeup written to the channel and not yet dispatched
    Queued = 1,
}

impl From<u32> for NotifyState {
    fn from(v: u32) -> Self {
        match v {
            0 => NotifyState::Idle,
            _ => NotifyState::Queued,
        }
    }
}

/// Atomic idle/queued flag
#[derive(Debug)]
pub struct CoalesceFlag {
    state: AtomicU32,
}

impl CoalesceFlag {
    /// Create a flag in the idle state
    #[inline]
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(NotifyState::Idle as u32),
        }
    }

    /// Attempt idle→queued
    ///
    /// Returns `true` if this call made the transition, meaning the caller
    /// owns the single in-flight wakeup and must deliver it.
    #[inline]
    pub fn try_queue(&self) -> bool {
        self.state
            .compare_exchange(
                NotifyState::Idle as u32,
                NotifyState::Queued as u32,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Attempt queued→idle
    ///
    /// Returns `true` if a transition happened. Used by the dispatch loop
    /// before running a callback, and by producers to roll back a
    /// wakeup that could not be written.
    #[inline]
    pub fn reset(&self) -> bool {
        self.state
            .compare_exchange(
                NotifyState::Queued as u32,
                NotifyState::Idle as u32,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Current state (a hint; may change immediately)
    #[inline]
    pub fn load(&self) -> NotifyState {
        NotifyState::from(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        self.load() == NotifyState::Queued
    }
}

impl Default for CoalesceFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_queue_then_coalesce() {
        let flag = CoalesceFlag::new();
        assert_eq!(flag.load(), NotifyState::Idle);

        assert!(flag.try_queue());
        assert!(!flag.try_queue());
        assert!(flag.is_queued());
    }

    #[test]
    fn test_reset() {
        let flag = CoalesceFlag::new();

        // Nothing to reset while idle
        assert!(!flag.reset());

        flag.try_queue();
        assert!(flag.reset());
        assert!(!flag.reset());
        assert_eq!(flag.load(), NotifyState::Idle);

        // Queue again after reset
        assert!(flag.try_queue());
    }

    #[test]
    fn test_concurrent_queue_single_winner() {
        let flag = Arc::new(CoalesceFlag::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..8 {
            let flag = Arc::clone(&flag);
            let winners = Arc::clone(&winners);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    if flag.try_queue() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
