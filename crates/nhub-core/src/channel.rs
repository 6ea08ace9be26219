//! Wakeup channel abstraction.
//!
//! A `WakeChannel` is a connected byte-stream pair used purely to carry
//! notifier keys from producer threads to the pump thread.
//!
//! # Implementors
//!
//! - `nhub_channel::SocketChannel` built by `socket_pair()` (default):
//!   `socketpair(AF_UNIX, SOCK_STREAM)`.
//!
//! - `nhub_channel::SocketChannel` built by `loopback_pair()` (fallback):
//!   a TCP connection over 127.0.0.1 made by a listen/connect/accept
//!   handshake, for hosts without a native socket pair primitive.

use std::fmt;
use std::io;
use std::os::fd::RawFd;
use std::str::FromStr;

/// Connected byte-stream pair carrying wakeup keys.
///
/// **Contract:**
/// - `send()` must NEVER block and must not take locks or allocate.
///   It may be called concurrently from any number of threads. A full
///   channel is reported as `WouldBlock`.
/// - A `send()` of 4 bytes or fewer is delivered intact, not interleaved
///   byte-wise with concurrent sends (stream socket atomicity for small
///   writes).
/// - `recv()` is called from one thread at a time (the pump). It blocks
///   or not according to `set_blocking()`.
/// - `recv()` returning `Ok(0)` means the write end is gone for good.
pub trait WakeChannel: Send + Sync {
    /// Write `buf` to the write end. Returns the number of bytes written.
    fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// Read available bytes from the read end.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Wait until the write end can take more bytes.
    ///
    /// Only used to finish a key that was partially written.
    fn wait_writable(&self) -> io::Result<()> {
        std::thread::yield_now();
        Ok(())
    }

    /// Switch the read end between blocking and non-blocking mode.
    fn set_blocking(&self, blocking: bool) -> io::Result<()>;

    /// Descriptor of the read end, for poll/epoll readiness.
    fn read_fd(&self) -> RawFd;

    /// Implementation name (for logging).
    fn name(&self) -> &'static str;
}

/// Which channel construction to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelKind {
    /// Native socket pair, falling back to loopback if it cannot be created
    #[default]
    Auto,
    /// Native socket pair only
    SocketPair,
    /// Loopback TCP handshake only
    Loopback,
}

impl FromStr for ChannelKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ChannelKind::Auto),
            "socketpair" | "pair" | "unix" => Ok(ChannelKind::SocketPair),
            "loopback" | "tcp" => Ok(ChannelKind::Loopback),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Auto => write!(f, "auto"),
            ChannelKind::SocketPair => write!(f, "socketpair"),
            ChannelKind::Loopback => write!(f, "loopback"),
        }
    }
}
