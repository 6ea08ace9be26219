//! # nhub - Cross-thread Notification Hub
//!
//! Lets any thread (including native threads through the C ABI) request
//! that a callback run on one designated pump thread, without taking a
//! lock on the poking side.
//!
//! ## Features
//!
//! - **Coalescing**: repeated pokes before dispatch run the callback once
//! - **Lock-free poke**: one compare-exchange plus one non-blocking `send(2)`
//! - **Event-loop friendly**: `fileno()` is readable when `handle()` has work
//! - **Interruptible**: `interrupt()` ends a blocking `handle()` call
//! - **Fault isolation**: a failing or panicking callback is logged and skipped
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use nhub::{NotificationHub, PumpExit};
//!
//! let hub = Arc::new(NotificationHub::new(true)?);
//! let notifier = hub.add_notify(|| println!("poked"))?;
//!
//! std::thread::spawn(move || {
//!     notifier.poke().ok();
//! });
//!
//! loop {
//!     match hub.handle()? {
//!         PumpExit::Interrupted | PumpExit::Closed => break,
//!         PumpExit::WouldBlock => {}
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  poke()            ┌──────────────────────────┐
//! │ producer     │ ── CAS idle→queued │ NotificationHub          │
//! │ threads      │ ── send(key) ────► │   channel (socketpair or │
//! │ (Rust or C)  │                    │   loopback TCP)          │
//! └──────────────┘                    │   registry key → Weak    │
//!                                     └────────────┬─────────────┘
//!                                                  │ handle()
//!                                                  ▼
//!                                     ┌──────────────────────────┐
//!                                     │ pump thread              │
//!                                     │ recv → decode → reset →  │
//!                                     │ callback                 │
//!                                     └──────────────────────────┘
//! ```
//!
//! ## Logging
//!
//! The library emits `tracing` events and installs no subscriber. The
//! binaries under `cmd/` install one filtered by `NHUB_LOG`.

pub mod config;
pub mod ffi;
mod hub;
mod notifier;
mod registry;
mod stats;

pub use config::HubConfig;
pub use hub::{NotificationHub, PumpExit};
pub use notifier::Notifier;
pub use stats::HubStatsSnapshot;

// Re-export core types
pub use nhub_core::{
    CallbackError, ChannelKind, HubError, HubResult, NotifyKey, NotifyState, WakeChannel,
};

/// Channel implementations, for use with `NotificationHub::with_channel()`
pub use nhub_channel as channel;

pub mod prelude {
    pub use crate::{HubConfig, HubError, HubResult, NotificationHub, Notifier, PumpExit};
}
