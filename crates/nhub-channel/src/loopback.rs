//! Loopback TCP channel - fallback where no native socket pair exists.
//!
//! Binds a listener on 127.0.0.1:0, connects to it, and accepts until
//! the accepted connection's peer address is our client's local address.
//! Anything that reached the listener ahead of our client is discarded.

use crate::socket::SocketChannel;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::os::fd::OwnedFd;

/// Foreign connections discarded before giving up
const MAX_STRANGERS: usize = 8;

/// Create a channel from a loopback TCP connection.
pub fn loopback_pair() -> io::Result<SocketChannel> {
    let (client, server) = handshake()?;

    // Keys are 4-byte writes; don't let Nagle hold them back.
    client.set_nodelay(true)?;
    server.set_nodelay(true)?;

    SocketChannel::from_fds(OwnedFd::from(client), OwnedFd::from(server), "loopback")
}

/// Connect a client to a fresh loopback listener and accept it.
///
/// Returns `(client, server)`.
fn handshake() -> io::Result<(TcpStream, TcpStream)> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    handshake_on(&listener)
}

fn handshake_on(listener: &TcpListener) -> io::Result<(TcpStream, TcpStream)> {
    // The connection completes in the listen backlog, so accept
    // after connect does not deadlock.
    let client = TcpStream::connect(listener.local_addr()?)?;
    let expected = client.local_addr()?;

    // The backlog is FIFO; our client is behind whatever got there first.
    for discarded in 0..MAX_STRANGERS {
        let (server, peer) = listener.accept()?;
        if peer == expected {
            return Ok((client, server));
        }
        tracing::warn!(%peer, discarded, "loopback handshake accepted a stranger, dropping it");
    }

    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        "loopback handshake kept accepting foreign connections",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nhub_core::channel::WakeChannel;

    #[test]
    fn test_handshake_addresses_match() {
        let (client, server) = handshake().unwrap();

        assert_eq!(client.local_addr().unwrap(), server.peer_addr().unwrap());
        assert_eq!(server.local_addr().unwrap(), client.peer_addr().unwrap());
    }

    #[test]
    fn test_handshake_skips_stranger() {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
        let stranger = TcpStream::connect(listener.local_addr().unwrap()).unwrap();

        let (client, server) = handshake_on(&listener).unwrap();
        assert_eq!(client.local_addr().unwrap(), server.peer_addr().unwrap());
        assert_ne!(stranger.local_addr().unwrap(), server.peer_addr().unwrap());
    }

    #[test]
    fn test_handshake_gives_up_on_crowded_listener() {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
        let addr = listener.local_addr().unwrap();
        let _strangers: Vec<_> = (0..MAX_STRANGERS)
            .map(|_| TcpStream::connect(addr).unwrap())
            .collect();

        let err = handshake_on(&listener).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }

    #[test]
    fn test_loopback_passes_bytes() {
        let ch = loopback_pair().unwrap();
        ch.set_blocking(true).unwrap();

        assert_eq!(ch.send(b"!").unwrap(), 1);
        let mut buf = [0u8; 1];
        assert_eq!(ch.recv(&mut buf).unwrap(), 1);
        assert_eq!(&buf, b"!");
        assert_eq!(ch.name(), "loopback");
    }
}
