//! Error types for the notification hub

use std::io;
use thiserror::Error;

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Error a fallible notifier callback may return
///
/// Callback errors never propagate out of the dispatch loop; they are
/// logged against the notifier's key and counted.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in hub operations
#[derive(Debug, Error)]
pub enum HubError {
    /// Registry holds as many notifiers as the key space allows
    #[error("too many notifiers: {live} live, limit {limit}")]
    KeyspaceExhausted { live: usize, limit: u64 },

    /// Channel I/O failed (other than would-block or closed)
    #[error("channel I/O error: {0}")]
    Io(#[from] io::Error),

    /// A key was cut short by a write error; the byte stream is no
    /// longer aligned and the hub cannot deliver wakeups any more
    #[error("wakeup channel broken by a partial write")]
    ChannelBroken,

    /// The notifier's hub has been dropped
    #[error("notification hub is gone")]
    HubGone,

    /// Another thread is already running the dispatch loop
    #[error("dispatch loop already running on another thread")]
    PumpBusy,

    /// Invalid configuration
    #[error("invalid config: {0}")]
    Config(&'static str),
}

impl HubError {
    /// Check if the error came from the OS channel
    pub fn is_io(&self) -> bool {
        matches!(self, HubError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = HubError::KeyspaceExhausted { live: 3, limit: 3 };
        assert_eq!(format!("{}", e), "too many notifiers: 3 live, limit 3");

        let e = HubError::Config("recv_chunk must be at least 4");
        assert_eq!(format!("{}", e), "invalid config: recv_chunk must be at least 4");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::from(io::ErrorKind::BrokenPipe);
        let hub_err: HubError = io_err.into();
        assert!(hub_err.is_io());
        assert!(!HubError::ChannelBroken.is_io());
    }
}
