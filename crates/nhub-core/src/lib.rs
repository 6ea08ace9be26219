//! # nhub-core
//!
//! Core types for the nhub notification hub.
//!
//! This crate is platform-agnostic and does no I/O of its own.
//! Channel implementations live in `nhub-channel`, the hub itself in `nhub`.
//!
//! ## Modules
//!
//! - `key` - 32-bit notifier key type
//! - `state` - Lock-free idle/queued coalescing flag
//! - `allocator` - Wrapping key allocator that skips occupied keys
//! - `codec` - 4-byte key wire codec with partial-read reassembly
//! - `channel` - Byte-stream channel trait used as the wakeup substrate
//! - `error` - Error types
//! - `env` - Environment variable utilities

pub mod key;
pub mod state;
pub mod allocator;
pub mod codec;
pub mod channel;
pub mod error;
pub mod env;

// Re-exports for convenience
pub use key::NotifyKey;
pub use state::{CoalesceFlag, NotifyState};
pub use allocator::KeyAllocator;
pub use codec::{encode_key, KeyDecoder};
pub use channel::{ChannelKind, WakeChannel};
pub use error::{CallbackError, HubError, HubResult};
pub use env::{env_get, env_get_bool, env_get_u64};

/// Constants shared by the hub and its channels
pub mod constants {
    /// Size of one key on the wire
    pub const KEY_WIRE_SIZE: usize = 4;

    /// Registry size at which registration fails
    pub const DEFAULT_KEY_LIMIT: u64 = 0xFFFF_FFFF;

    /// Bytes requested per channel read
    pub const DEFAULT_RECV_CHUNK: usize = 1024;
}
