//! `Notifier` - the handle producers poke.
//!
//! Created by `NotificationHub::add_notify()`. Wakeups coalesce: any
//! number of `poke()` calls before the pump dispatches this notifier
//! result in one callback invocation.
//!
//! `poke()` takes no lock and never blocks. It upgrades the weak hub
//! reference, does one compare-exchange on the coalescing flag and, if
//! that wins, one non-blocking `send(2)` of the 4-byte key. Only when the
//! channel is full does it touch the hub's lock-free overflow queue. The
//! C ABI in `ffi` exposes exactly this path to native threads.

use std::fmt;
use std::sync::{Arc, Weak};

use nhub_core::error::{CallbackError, HubError, HubResult};
use nhub_core::key::NotifyKey;
use nhub_core::state::CoalesceFlag;

use crate::ffi::nhub_notifier;
use crate::hub::HubShared;
use crate::stats::bump;

pub(crate) type Callback = Box<dyn Fn() -> Result<(), CallbackError> + Send + Sync + 'static>;

pub(crate) struct NotifierInner {
    key: NotifyKey,
    flag: CoalesceFlag,
    hub: Weak<HubShared>,
    callback: Callback,
}

impl NotifierInner {
    pub(crate) fn new(key: NotifyKey, hub: Weak<HubShared>, callback: Callback) -> Self {
        Self {
            key,
            flag: CoalesceFlag::new(),
            hub,
            callback,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> NotifyKey {
        self.key
    }

    pub(crate) fn poke(&self) -> HubResult<bool> {
        let hub = self.hub.upgrade().ok_or(HubError::HubGone)?;

        if !self.flag.try_queue() {
            bump(&hub.stats.pokes_coalesced);
            return Ok(false);
        }

        match hub.send_key(self.key) {
            Ok(()) => {
                bump(&hub.stats.pokes_delivered);
                Ok(true)
            }
            Err(e) => {
                // Nothing is in flight; let the next poke try again.
                self.flag.reset();
                Err(e)
            }
        }
    }

    /// queued→idle, called by the pump right before the callback.
    #[inline]
    pub(crate) fn reset(&self) -> bool {
        self.flag.reset()
    }

    #[inline]
    pub(crate) fn run_callback(&self) -> Result<(), CallbackError> {
        (self.callback)()
    }
}

impl Drop for NotifierInner {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.deregister(self.key);
        }
    }
}

/// Handle to trigger notifications through its `NotificationHub`.
///
/// Clones share the same key, flag and callback. The notifier stays
/// registered while any clone is alive; once the last one is dropped,
/// wakeups still in the channel for its key are ignored on delivery.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl Notifier {
    pub(crate) fn from_inner(inner: Arc<NotifierInner>) -> Self {
        Self { inner }
    }

    /// Key this notifier writes into the channel
    #[inline]
    pub fn key(&self) -> NotifyKey {
        self.inner.key
    }

    /// Request a callback invocation on the pump thread.
    ///
    /// Returns `Ok(true)` if this call queued a wakeup, `Ok(false)` if one
    /// was already outstanding. Safe to call from any thread, including
    /// ones that must not block or take locks.
    ///
    /// A full channel is not an error; the wakeup is still delivered.
    /// On error nothing is queued: `HubGone` if the hub was dropped,
    /// `ChannelBroken` after an earlier partial write, `Io` otherwise.
    #[inline]
    pub fn poke(&self) -> HubResult<bool> {
        self.inner.poke()
    }

    /// Whether a wakeup is outstanding (a hint; may change immediately)
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.inner.flag.is_queued()
    }

    /// Whether the owning hub still exists
    pub fn hub_alive(&self) -> bool {
        self.inner.hub.strong_count() > 0
    }

    /// Borrowed C handle for `nhub_notifier_poke()`.
    ///
    /// The pointer is valid only while this `Notifier` (or a clone) is
    /// alive; the caller must guarantee that for as long as native code
    /// may poke it.
    #[inline]
    pub fn as_raw(&self) -> *const nhub_notifier {
        Arc::as_ptr(&self.inner).cast()
    }

    /// Owned C handle. Release it with `nhub_notifier_release()` or
    /// `Notifier::from_raw()`.
    pub fn into_raw(self) -> *const nhub_notifier {
        Arc::into_raw(self.inner).cast()
    }

    /// Reclaim a handle produced by `into_raw()`.
    ///
    /// # Safety
    ///
    /// `raw` must come from `Notifier::into_raw()` and must not be used
    /// again afterwards.
    pub unsafe fn from_raw(raw: *const nhub_notifier) -> Self {
        Self {
            inner: Arc::from_raw(raw.cast::<NotifierInner>()),
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("key", &self.inner.key)
            .field("state", &self.inner.flag.load())
            .finish()
    }
}
