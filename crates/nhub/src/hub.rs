//! # NotificationHub - the dispatch side
//!
//! The hub owns the wakeup channel, the key registry and the dispatch
//! loop. One thread (the pump) calls `handle()`:
//!
//! ```text
//! loop {
//!     1. recv() from the channel read end
//!          would-block → return WouldBlock
//!          closed      → return Closed
//!     2. prepend bytes left over from the previous read,
//!        keep the trailing <4 bytes for next time
//!     3. for each 4-byte key, in arrival order:
//!          lookup → miss?        ignore (notifier dropped)
//!          reset  → not queued?  skip
//!          run callback, catching errors and panics
//!     4. dispatch keys parked in the overflow queue
//!     5. pending interrupt?  consume one, return Interrupted
//! }
//! ```
//!
//! The registry mutex is held only to allocate/insert/remove/lookup,
//! never across channel I/O or a callback.
//!
//! ## Full channel
//!
//! A poke that finds the channel's send buffer full pushes its key onto a
//! lock-free overflow queue and writes the key once more. If that write
//! also finds the channel full, unread keys are pending and the batch that
//! reads them is followed by step 4. If it goes through, the key arrives
//! twice and the second copy is skipped as not queued. Either way the
//! wakeup is neither lost nor blocked on.

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_queue::SegQueue;
use parking_lot::Mutex;

use nhub_core::channel::WakeChannel;
use nhub_core::codec::{encode_key, KeyDecoder};
use nhub_core::constants::KEY_WIRE_SIZE;
use nhub_core::error::{CallbackError, HubError, HubResult};
use nhub_core::key::NotifyKey;

use crate::config::HubConfig;
use crate::ffi::nhub_hub;
use crate::notifier::{Callback, Notifier, NotifierInner};
use crate::registry::Registry;
use crate::stats::{bump, HubStats, HubStatsSnapshot};

/// Why a `handle()` call returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// Non-blocking read found no data; wait for `fileno()` readiness
    WouldBlock,
    /// `interrupt()` was requested
    Interrupted,
    /// The write end is gone; no more wakeups will arrive
    Closed,
}

/// State touched only by the pump
struct PumpState {
    decoder: KeyDecoder,
    buf: Vec<u8>,
    keys: Vec<NotifyKey>,
}

/// Hub state shared with notifiers (through `Weak`)
pub(crate) struct HubShared {
    channel: Box<dyn WakeChannel>,
    registry: Mutex<Registry>,
    pump: Mutex<PumpState>,
    overflow: SegQueue<NotifyKey>,
    interruptions: AtomicUsize,
    /// Set when a key was cut short; nothing read after it can be decoded
    broken: AtomicBool,
    pub(crate) stats: HubStats,
}

impl HubShared {
    /// Deliver one key. Called by `Notifier::poke()` after winning idle→queued.
    pub(crate) fn send_key(&self, key: NotifyKey) -> HubResult<()> {
        if self.broken.load(Ordering::Acquire) {
            return Err(HubError::ChannelBroken);
        }

        let wire = encode_key(key);
        if self.write_key(&wire)? {
            return Ok(());
        }

        self.overflow.push(key);
        bump(&self.stats.overflowed);
        tracing::trace!(%key, "channel full, key parked in overflow queue");
        self.write_key(&wire)?;
        Ok(())
    }

    /// Write one encoded key. `Ok(false)` if the channel was full and
    /// nothing was written.
    fn write_key(&self, wire: &[u8; KEY_WIRE_SIZE]) -> HubResult<bool> {
        let mut sent = 0;

        while sent < KEY_WIRE_SIZE {
            match self.channel.send(&wire[sent..]) {
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock && sent == 0 => return Ok(false),
                // A partial key would misalign the stream for every later
                // key, so finish it.
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if let Err(e) = self.channel.wait_writable() {
                        return Err(self.mark_broken(sent, e));
                    }
                }
                Err(e) if sent == 0 => return Err(e.into()),
                Err(e) => return Err(self.mark_broken(sent, e)),
            }
        }
        Ok(true)
    }

    fn mark_broken(&self, sent: usize, err: io::Error) -> HubError {
        self.broken.store(true, Ordering::Release);
        tracing::error!(sent, error = %err, "key write failed part way, wakeup channel is unusable");
        HubError::Io(err)
    }

    pub(crate) fn deregister(&self, key: NotifyKey) {
        self.registry.lock().remove(key);
        tracing::trace!(%key, "notifier dropped");
    }

    fn register(self: &Arc<Self>, callback: Callback) -> HubResult<Notifier> {
        let key = self.registry.lock().reserve()?;
        let inner = Arc::new(NotifierInner::new(key, Arc::downgrade(self), callback));
        self.registry.lock().fill(key, &inner);

        tracing::debug!(key = %inner.key(), "notifier registered");
        Ok(Notifier::from_inner(inner))
    }

    fn dispatch(&self, key: NotifyKey) {
        // Bind first: the registry guard must be gone before `notif` can drop.
        let found = self.registry.lock().lookup(key);
        let Some(notif) = found else {
            bump(&self.stats.stale_keys);
            tracing::debug!(%key, "ignoring wakeup for dropped notifier");
            return;
        };

        if !notif.reset() {
            bump(&self.stats.spurious);
            tracing::warn!(%key, "wakeup for notifier that was not queued");
            return;
        }

        tracing::trace!(%key, "notify");
        bump(&self.stats.dispatched);
        match panic::catch_unwind(AssertUnwindSafe(|| notif.run_callback())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                bump(&self.stats.callback_failures);
                tracing::error!(%key, error = %e, "unhandled error in notifier callback");
            }
            Err(payload) => {
                bump(&self.stats.callback_failures);
                tracing::error!(%key, panic = panic_message(&*payload), "notifier callback panicked");
            }
        }
    }

    fn take_interruption(&self) -> bool {
        self.interruptions
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Creates `Notifier`s and dispatches their callbacks.
///
/// Share it between the pump and producers with `Arc<NotificationHub>`.
/// Several hubs may coexist; each has its own channel and key space.
pub struct NotificationHub {
    interrupt: Notifier,
    shared: Arc<HubShared>,
    config: HubConfig,
}

impl NotificationHub {
    /// Create a hub with library defaults.
    ///
    /// `blocking` controls whether `handle()` waits for channel data.
    pub fn new(blocking: bool) -> HubResult<Self> {
        Self::with_config(HubConfig::new().blocking(blocking))
    }

    /// Create a hub from `HubConfig::from_env()`.
    pub fn from_env() -> HubResult<Self> {
        Self::with_config(HubConfig::from_env())
    }

    pub fn with_config(config: HubConfig) -> HubResult<Self> {
        config.validate()?;
        let channel = nhub_channel::open_boxed(config.channel, config.blocking)?;
        Self::with_channel(channel, config)
    }

    /// Create a hub over a caller-supplied channel.
    ///
    /// `config.channel` is ignored; the read end is switched to
    /// `config.blocking`.
    pub fn with_channel(channel: Box<dyn WakeChannel>, config: HubConfig) -> HubResult<Self> {
        config.validate()?;
        channel.set_blocking(config.blocking)?;

        let shared = Arc::new(HubShared {
            channel,
            registry: Mutex::new(Registry::new(NotifyKey::new(config.first_key), config.key_limit)),
            pump: Mutex::new(PumpState {
                decoder: KeyDecoder::new(),
                buf: vec![0u8; config.recv_chunk],
                keys: Vec::with_capacity(config.recv_chunk / KEY_WIRE_SIZE + 1),
            }),
            overflow: SegQueue::new(),
            interruptions: AtomicUsize::new(0),
            broken: AtomicBool::new(false),
            stats: HubStats::default(),
        });

        let weak: Weak<HubShared> = Arc::downgrade(&shared);
        let interrupt = shared.register(Box::new(move || {
            if let Some(hub) = weak.upgrade() {
                hub.interruptions.fetch_add(1, Ordering::AcqRel);
            }
            Ok(())
        }))?;

        tracing::debug!(
            channel = shared.channel.name(),
            blocking = config.blocking,
            interrupt_key = %interrupt.key(),
            "notification hub created"
        );

        Ok(Self {
            interrupt,
            shared,
            config,
        })
    }

    /// Register a callback and return the `Notifier` that triggers it.
    ///
    /// The callback runs on the pump thread. A panic in it is caught and
    /// logged; it does not reach `handle()`'s caller.
    pub fn add_notify<F>(&self, callback: F) -> HubResult<Notifier>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.register(Box::new(move || {
            callback();
            Ok(())
        }))
    }

    /// Like `add_notify`, for callbacks that report failure.
    ///
    /// An `Err` is logged with the notifier's key and otherwise ignored.
    pub fn add_notify_fallible<F>(&self, callback: F) -> HubResult<Notifier>
    where
        F: Fn() -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.shared.register(Box::new(callback))
    }

    /// Run the dispatch loop until the channel is drained, closed, or an
    /// interruption is consumed.
    ///
    /// Only one thread may pump at a time; a concurrent call returns
    /// `PumpBusy`. Callbacks may register, poke and interrupt freely.
    pub fn handle(&self) -> HubResult<PumpExit> {
        let shared = &*self.shared;
        let mut guard = shared.pump.try_lock().ok_or(HubError::PumpBusy)?;
        let PumpState { decoder, buf, keys } = &mut *guard;

        loop {
            if shared.broken.load(Ordering::Acquire) {
                return Err(HubError::ChannelBroken);
            }

            let n = match shared.channel.recv(buf) {
                Ok(0) => {
                    tracing::debug!("wakeup channel closed");
                    return Ok(PumpExit::Closed);
                }
                Ok(n) => n,
                Err(e) => match e.kind() {
                    io::ErrorKind::WouldBlock => return Ok(PumpExit::WouldBlock),
                    io::ErrorKind::Interrupted => continue,
                    _ => return Err(e.into()),
                },
            };

            keys.clear();
            decoder.feed(&buf[..n], keys);
            for key in keys.iter() {
                shared.dispatch(*key);
            }

            // Only what is parked now; keys re-parked by callbacks wait for
            // the next batch.
            for _ in 0..shared.overflow.len() {
                match shared.overflow.pop() {
                    Some(key) => shared.dispatch(key),
                    None => break,
                }
            }

            if shared.take_interruption() {
                return Ok(PumpExit::Interrupted);
            }
        }
    }

    /// Make a current or future `handle()` call return `Interrupted`.
    ///
    /// Coalesces like any poke: interrupts issued while one is still
    /// outstanding end only one `handle()` call. Returns whether this
    /// call queued the wakeup.
    pub fn interrupt(&self) -> HubResult<bool> {
        let queued = self.interrupt.poke()?;
        if queued {
            bump(&self.shared.stats.interrupts);
            tracing::debug!("interrupt queued");
        }
        Ok(queued)
    }

    /// Descriptor of the channel read end.
    ///
    /// When it is readable, `handle()` has work to do.
    pub fn fileno(&self) -> RawFd {
        self.shared.channel.read_fd()
    }

    /// Switch `handle()` between blocking and non-blocking reads.
    pub fn set_blocking(&self, blocking: bool) -> HubResult<()> {
        self.shared.channel.set_blocking(blocking)?;
        Ok(())
    }

    /// Registered notifiers, including the internal interrupt notifier.
    pub fn len(&self) -> usize {
        self.shared.registry.lock().len()
    }

    /// Always false: the interrupt notifier is registered for the hub's lifetime.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a thread is inside `handle()` right now
    pub fn is_pumping(&self) -> bool {
        self.shared.pump.is_locked()
    }

    /// Next key candidate (for diagnostics)
    pub fn next_key(&self) -> NotifyKey {
        self.shared.registry.lock().next_key()
    }

    pub fn stats(&self) -> HubStatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Name of the channel implementation in use
    pub fn channel_name(&self) -> &'static str {
        self.shared.channel.name()
    }

    /// Borrowed C handle for `nhub_hub_interrupt()`.
    ///
    /// Valid while this hub is alive and not moved.
    pub fn as_raw(&self) -> *const nhub_hub {
        (self as *const Self).cast()
    }
}

impl AsRawFd for NotificationHub {
    fn as_raw_fd(&self) -> RawFd {
        self.fileno()
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("channel", &self.channel_name())
            .field("fd", &self.fileno())
            .field("notifiers", &self.len())
            .field("config", &self.config)
            .finish()
    }
}
