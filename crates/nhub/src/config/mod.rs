//! Hub configuration
//!
//! Library defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (`from_env()` only)
//! 3. Library defaults (`defaults`)
//!
//! # Example
//!
//! ```rust,ignore
//! use nhub::{HubConfig, NotificationHub};
//!
//! let config = HubConfig::from_env().blocking(false);
//! let hub = NotificationHub::with_config(config)?;
//! ```

pub mod defaults;

use nhub_core::channel::ChannelKind;
use nhub_core::constants::KEY_WIRE_SIZE;
use nhub_core::env::{env_get, env_get_bool, env_get_u64};
use nhub_core::error::{HubError, HubResult};

/// Hub configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Whether `handle()` blocks waiting for channel data
    pub blocking: bool,
    /// Bytes requested per channel read
    pub recv_chunk: usize,
    /// Channel construction
    pub channel: ChannelKind,
    /// Registry size at which registration fails
    pub key_limit: u64,
    /// First key handed out
    pub first_key: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl HubConfig {
    /// Create config from library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `NHUB_BLOCKING` - Blocking reads in `handle()` (0/1)
    /// - `NHUB_RECV_CHUNK` - Bytes per channel read (at least 4)
    /// - `NHUB_CHANNEL` - `auto`, `socketpair` or `loopback`
    /// - `NHUB_KEY_LIMIT` - Max live notifiers (decimal or 0x hex)
    /// - `NHUB_FIRST_KEY` - First key handed out (decimal or 0x hex)
    pub fn from_env() -> Self {
        Self {
            blocking: env_get_bool("NHUB_BLOCKING", defaults::BLOCKING),
            recv_chunk: env_get("NHUB_RECV_CHUNK", defaults::RECV_CHUNK).max(KEY_WIRE_SIZE),
            channel: env_get("NHUB_CHANNEL", defaults::CHANNEL),
            key_limit: env_get_u64("NHUB_KEY_LIMIT", defaults::KEY_LIMIT),
            first_key: u32::try_from(env_get_u64("NHUB_FIRST_KEY", defaults::FIRST_KEY as u64))
                .unwrap_or(defaults::FIRST_KEY),
        }
    }

    /// Create config with library defaults (no env override).
    pub fn new() -> Self {
        Self {
            blocking: defaults::BLOCKING,
            recv_chunk: defaults::RECV_CHUNK,
            channel: defaults::CHANNEL,
            key_limit: defaults::KEY_LIMIT,
            first_key: defaults::FIRST_KEY,
        }
    }

    // Builder methods

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn recv_chunk(mut self, bytes: usize) -> Self {
        self.recv_chunk = bytes;
        self
    }

    pub fn channel(mut self, kind: ChannelKind) -> Self {
        self.channel = kind;
        self
    }

    /// Max live notifiers, including the hub's own interrupt notifier
    pub fn key_limit(mut self, limit: u64) -> Self {
        self.key_limit = limit;
        self
    }

    pub fn first_key(mut self, key: u32) -> Self {
        self.first_key = key;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> HubResult<()> {
        if self.recv_chunk < KEY_WIRE_SIZE {
            return Err(HubError::Config("recv_chunk must be at least 4"));
        }
        if self.key_limit == 0 {
            return Err(HubError::Config("key_limit must leave room for the interrupt notifier"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = HubConfig::new();
        assert!(config.blocking);
        assert_eq!(config.recv_chunk, 1024);
        assert_eq!(config.channel, ChannelKind::Auto);
        assert_eq!(config.key_limit, 0xFFFF_FFFF);
        assert_eq!(config.first_key, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = HubConfig::new()
            .blocking(false)
            .recv_chunk(64)
            .channel(ChannelKind::Loopback)
            .key_limit(10)
            .first_key(u32::MAX - 2);

        assert!(!config.blocking);
        assert_eq!(config.recv_chunk, 64);
        assert_eq!(config.channel, ChannelKind::Loopback);
        assert_eq!(config.key_limit, 10);
        assert_eq!(config.first_key, u32::MAX - 2);
    }

    #[test]
    fn test_validation() {
        assert!(HubConfig::new().recv_chunk(3).validate().is_err());
        assert!(HubConfig::new().key_limit(0).validate().is_err());
        assert!(HubConfig::new().recv_chunk(4).key_limit(1).validate().is_ok());
    }

    #[test]
    fn test_from_env() {
        // Only checks that from_env yields something usable; the NHUB_*
        // variables are not set in the test environment.
        let config = HubConfig::from_env();
        assert!(config.validate().is_ok());
    }
}
