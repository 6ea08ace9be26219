//! Native AF_UNIX socket pair.

use crate::socket::SocketChannel;
use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};
use std::io;

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))] {
        fn pair_flags() -> SockFlag {
            SockFlag::SOCK_CLOEXEC
        }
    } else {
        fn pair_flags() -> SockFlag {
            SockFlag::empty()
        }
    }
}

/// Create a channel from `socketpair(AF_UNIX, SOCK_STREAM)`.
pub fn socket_pair() -> io::Result<SocketChannel> {
    let (tx, rx) = socketpair(AddressFamily::Unix, SockType::Stream, None, pair_flags())?;
    SocketChannel::from_fds(tx, rx, "socketpair")
}
