//! Key → notifier registry
//!
//! Entries are `Weak`: the registry never keeps a notifier alive. The
//! application's `Notifier` handles are the strong owners, and the last
//! one to go removes the entry from `NotifierInner::drop`. An entry whose
//! `Weak` no longer upgrades is a notifier mid-teardown; it still occupies
//! its key so the key cannot be handed out until the entry is removed.
//!
//! Lives behind the hub's registry mutex. Never drop a `NotifierInner`
//! while holding that mutex: its `Drop` takes the same lock.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use nhub_core::allocator::KeyAllocator;
use nhub_core::error::HubResult;
use nhub_core::key::NotifyKey;

use crate::notifier::NotifierInner;

pub(crate) struct Registry {
    alloc: KeyAllocator,
    entries: HashMap<NotifyKey, Weak<NotifierInner>>,
}

impl Registry {
    pub(crate) fn new(first_key: NotifyKey, limit: u64) -> Self {
        Self {
            alloc: KeyAllocator::with_start(first_key, limit),
            entries: HashMap::new(),
        }
    }

    /// Allocate a key and hold it with an empty entry until `fill()`.
    ///
    /// The notifier is built between the two calls with the lock released,
    /// so a failed registration never drops user state under the lock.
    pub(crate) fn reserve(&mut self) -> HubResult<NotifyKey> {
        let entries = &self.entries;
        let key = self
            .alloc
            .allocate(entries.len(), |k| entries.contains_key(&k))?;
        self.entries.insert(key, Weak::new());
        Ok(key)
    }

    pub(crate) fn fill(&mut self, key: NotifyKey, notif: &Arc<NotifierInner>) {
        self.entries.insert(key, Arc::downgrade(notif));
    }

    /// Strong reference to a live notifier, `None` if it is gone.
    pub(crate) fn lookup(&self, key: NotifyKey) -> Option<Arc<NotifierInner>> {
        self.entries.get(&key).and_then(Weak::upgrade)
    }

    pub(crate) fn remove(&mut self, key: NotifyKey) {
        self.entries.remove(&key);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn next_key(&self) -> NotifyKey {
        self.alloc.peek()
    }
}
