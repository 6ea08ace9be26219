//! Key allocator for notifier registration
//!
//! Hands out keys from a wrapping 32-bit counter. Keys held by live
//! notifiers are skipped, so a key retired by a dropped notifier is
//! reused once the counter comes back around to it.
//!
//! The allocator does not own the registry. The caller passes an
//! occupancy test and must hold the registry lock across `allocate`
//! and the insertion of the returned key.

use crate::constants::DEFAULT_KEY_LIMIT;
use crate::error::{HubError, HubResult};
use crate::key::NotifyKey;

/// Wrapping key allocator
#[derive(Debug, Clone)]
pub struct KeyAllocator {
    /// Next candidate key
    next: NotifyKey,

    /// Registry size at which allocation fails
    limit: u64,
}

impl KeyAllocator {
    /// Create an allocator starting at key 0 with the full key space
    pub fn new() -> Self {
        Self::with_start(NotifyKey::new(0), DEFAULT_KEY_LIMIT)
    }

    /// Create an allocator with an explicit first key and registry limit
    ///
    /// The limit is capped at `0xFFFF_FFFF` so at least one key is always
    /// free when allocation is allowed to proceed.
    pub fn with_start(first: NotifyKey, limit: u64) -> Self {
        Self {
            next: first,
            limit: limit.min(DEFAULT_KEY_LIMIT),
        }
    }

    /// Allocate a key
    ///
    /// `live` is the current registry size, `occupied` reports whether a
    /// key is present in the registry. Returns the current candidate and
    /// advances past every occupied key so the next call is O(1) unless
    /// the registry is densely packed ahead of the counter.
    pub fn allocate<F>(&mut self, live: usize, occupied: F) -> HubResult<NotifyKey>
    where
        F: Fn(NotifyKey) -> bool,
    {
        if live as u64 >= self.limit {
            return Err(HubError::KeyspaceExhausted {
                live,
                limit: self.limit,
            });
        }

        // The candidate is free unless something was inserted behind our back.
        let mut key = self.next;
        while occupied(key) {
            key = key.next();
        }

        // `key` is not inserted yet, so this loop ends on it at the latest.
        let mut next = key.next();
        while occupied(next) {
            next = next.next();
        }
        self.next = next;

        Ok(key)
    }

    /// Next candidate key (for diagnostics)
    #[inline]
    pub fn peek(&self) -> NotifyKey {
        self.next
    }

    /// Registry size at which allocation fails
    #[inline]
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for KeyAllocator {
    fn default() -> Self {
        Self::new()
    }
}
