//! `SocketChannel` - a pair of connected stream sockets.
//!
//! Writes go straight to `send(2)` on the raw descriptor: no lock, no
//! allocation, no buffering in userspace. That keeps `send()` usable
//! from native threads and signal handlers.

use nhub_core::channel::WakeChannel;
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::socket::{recv, send, setsockopt, sockopt, MsgFlags};

use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};

/// Requested send buffer for the write end. The kernel may clamp it.
const SEND_BUFFER: usize = 1 << 20;

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))] {
        // A vanished reader must surface as EPIPE, not kill the process.
        const SEND_FLAGS: MsgFlags = MsgFlags::MSG_NOSIGNAL;
    } else {
        const SEND_FLAGS: MsgFlags = MsgFlags::empty();
    }
}

pub struct SocketChannel {
    tx: OwnedFd,
    rx: OwnedFd,
    name: &'static str,
}

impl SocketChannel {
    /// Wrap two connected stream sockets.
    ///
    /// `tx` is switched to non-blocking mode and its send buffer enlarged;
    /// `rx` is left as-is until `set_blocking()` is called.
    pub fn from_fds(tx: OwnedFd, rx: OwnedFd, name: &'static str) -> io::Result<Self> {
        set_nonblocking(tx.as_raw_fd(), true)?;
        // Every 4-byte write costs a whole buffer entry on AF_UNIX.
        if let Err(e) = setsockopt(&tx, sockopt::SndBuf, &SEND_BUFFER) {
            tracing::debug!(channel = name, error = %e, "could not enlarge send buffer");
        }
        Ok(Self { tx, rx, name })
    }

    /// Descriptor of the write end.
    pub fn write_fd(&self) -> RawFd {
        self.tx.as_raw_fd()
    }

    /// Whether the read end is currently in blocking mode.
    pub fn is_blocking(&self) -> io::Result<bool> {
        let flags = fcntl(self.rx.as_raw_fd(), FcntlArg::F_GETFL)?;
        Ok(!OFlag::from_bits_truncate(flags).contains(OFlag::O_NONBLOCK))
    }
}

fn set_nonblocking(fd: RawFd, nonblocking: bool) -> io::Result<()> {
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    let wanted = if nonblocking {
        flags | OFlag::O_NONBLOCK
    } else {
        flags.difference(OFlag::O_NONBLOCK)
    };
    if wanted != flags {
        fcntl(fd, FcntlArg::F_SETFL(wanted))?;
    }
    Ok(())
}

impl WakeChannel for SocketChannel {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match send(self.tx.as_raw_fd(), buf, SEND_FLAGS) {
                Err(Errno::EINTR) => continue,
                other => return other.map_err(io::Error::from),
            }
        }
    }

    fn wait_writable(&self) -> io::Result<()> {
        let mut fds = [PollFd::new(self.tx.as_fd(), PollFlags::POLLOUT)];
        loop {
            match poll(&mut fds, PollTimeout::NONE) {
                Err(Errno::EINTR) => continue,
                other => return other.map(drop).map_err(io::Error::from),
            }
        }
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        recv(self.rx.as_raw_fd(), buf, MsgFlags::empty()).map_err(io::Error::from)
    }

    fn set_blocking(&self, blocking: bool) -> io::Result<()> {
        set_nonblocking(self.rx.as_raw_fd(), !blocking)
    }

    fn read_fd(&self) -> RawFd {
        self.rx.as_raw_fd()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for SocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketChannel")
            .field("name", &self.name)
            .field("tx", &self.tx.as_raw_fd())
            .field("rx", &self.rx.as_raw_fd())
            .finish()
    }
}
