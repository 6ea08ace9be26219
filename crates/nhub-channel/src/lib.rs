//! # nhub-channel - Wakeup channel implementations
//!
//! Default implementations of `nhub_core::WakeChannel`.
//!
//! | Kind        | Construction                                   |
//! |-------------|------------------------------------------------|
//! | SocketPair  | `socketpair(AF_UNIX, SOCK_STREAM)`             |
//! | Loopback    | 127.0.0.1 listen/connect/accept handshake      |
//! | Auto        | SocketPair, Loopback if the pair can't be made |
//!
//! Both kinds end up as a `SocketChannel`: two connected stream sockets,
//! the write end non-blocking, the read end in the requested mode.

#![cfg(unix)]

pub mod socket;
pub mod socketpair;
pub mod loopback;

pub use socket::SocketChannel;

use nhub_core::channel::{ChannelKind, WakeChannel};
use std::io;

/// Open a wakeup channel of the requested kind.
///
/// `blocking` sets the mode of the read end.
pub fn open(kind: ChannelKind, blocking: bool) -> io::Result<SocketChannel> {
    let channel = match kind {
        ChannelKind::SocketPair => socketpair::socket_pair()?,
        ChannelKind::Loopback => loopback::loopback_pair()?,
        ChannelKind::Auto => match socketpair::socket_pair() {
            Ok(ch) => ch,
            Err(e) => {
                tracing::warn!(error = %e, "socketpair unavailable, using loopback channel");
                loopback::loopback_pair()?
            }
        },
    };
    channel.set_blocking(blocking)?;
    tracing::debug!(channel = channel.name(), blocking, "wakeup channel open");
    Ok(channel)
}

/// Open a channel and box it for use behind `dyn WakeChannel`.
pub fn open_boxed(kind: ChannelKind, blocking: bool) -> io::Result<Box<dyn WakeChannel>> {
    Ok(Box::new(open(kind, blocking)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_each_kind() {
        for kind in [ChannelKind::Auto, ChannelKind::SocketPair, ChannelKind::Loopback] {
            let ch = open(kind, false).unwrap();
            assert_eq!(ch.send(b"!").unwrap(), 1);

            let mut buf = [0u8; 8];
            let n = loop {
                match ch.recv(&mut buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
                    Err(e) => panic!("recv on {}: {}", kind, e),
                }
            };
            assert_eq!(&buf[..n], b"!");
        }
    }

    #[test]
    fn test_auto_prefers_socketpair() {
        let ch = open(ChannelKind::Auto, true).unwrap();
        assert_eq!(ch.name(), "socketpair");
    }
}
