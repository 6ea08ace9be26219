//! Library defaults for `HubConfig`

use nhub_core::channel::ChannelKind;
use nhub_core::constants::{DEFAULT_KEY_LIMIT, DEFAULT_RECV_CHUNK};

/// `handle()` blocks waiting for channel data
pub const BLOCKING: bool = true;

/// Bytes requested per channel read
pub const RECV_CHUNK: usize = DEFAULT_RECV_CHUNK;

/// Channel construction
pub const CHANNEL: ChannelKind = ChannelKind::Auto;

/// Registry size at which registration fails
pub const KEY_LIMIT: u64 = DEFAULT_KEY_LIMIT;

/// First key handed out (the hub's internal interrupt notifier gets it)
pub const FIRST_KEY: u32 = 0;
