//! Netlink uevent transport adapter
//!
//! Implements the core's [`IUeventSource`] port on top of the kernel's
//! `NETLINK_KOBJECT_UEVENT` multicast channel. The socket is opened
//! non-blocking and registered with tokio so a pending read can be awaited
//! without tying up a thread.
//!
//! The kernel frames each uevent as NUL-separated segments (the
//! `action@devpath` header first, `KEY=VALUE` records after). The core
//! expects newline-delimited lines, so this adapter rewrites the separators
//! before handing the buffer over; it does not otherwise interpret the
//! payload.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::unix::AsyncFd;
use tracing::{debug, trace};

use relmon_core::ports::IUeventSource;

/// Netlink protocol number for kernel object uevents.
const NETLINK_KOBJECT_UEVENT: libc::c_int = 15;

/// Multicast group the kernel broadcasts uevents on.
const UEVENT_GROUP_KERNEL: u32 = 1;

/// Receive buffer large enough for any single uevent plus queued bursts.
const RCVBUF_SIZE: libc::c_int = 256 * 1024;

/// Upper bound on a single uevent datagram.
const MAX_EVENT_SIZE: usize = 16 * 1024;

/// Uevent source backed by a netlink socket
pub struct NetlinkUeventSource {
    fd: AsyncFd<OwnedFd>,
}

impl NetlinkUeventSource {
    /// Opens and binds the kernel uevent multicast socket.
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot be created or bound, typically for lack
    /// of privileges or on kernels without `CONFIG_NET`.
    pub fn bind() -> Result<Self> {
        // SAFETY: plain socket(2) call; the result is checked before use.
        let raw = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_DGRAM | libc::SOCK_CLOEXEC | libc::SOCK_NONBLOCK,
                NETLINK_KOBJECT_UEVENT,
            )
        };
        if raw < 0 {
            return Err(io::Error::last_os_error()).context("Failed to create netlink socket");
        }
        // SAFETY: raw is a freshly created, valid file descriptor.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: passing a valid fd and a properly sized option value.
        unsafe {
            libc::setsockopt(
                fd.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_RCVBUF,
                &RCVBUF_SIZE as *const _ as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            );
        }

        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        addr.nl_pid = 0;
        addr.nl_groups = UEVENT_GROUP_KERNEL;

        // SAFETY: addr is a fully initialized sockaddr_nl for this fd.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error())
                .context("Failed to bind netlink socket to the uevent multicast group");
        }

        let fd = AsyncFd::new(fd).context("Failed to register netlink socket with the runtime")?;
        debug!("Listening on netlink kobject-uevent socket");
        Ok(Self { fd })
    }

    fn recv_one(&self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_EVENT_SIZE];
        // SAFETY: buf outlives the call and its length is passed alongside.
        let n = unsafe {
            libc::recv(
                self.fd.get_ref().as_raw_fd(),
                buf.as_mut_ptr().cast::<libc::c_void>(),
                buf.len(),
                0,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        buf.truncate(n as usize);
        Ok(buf)
    }
}

#[async_trait]
impl IUeventSource for NetlinkUeventSource {
    async fn next_event(&self) -> Result<Vec<u8>> {
        loop {
            let mut guard = self
                .fd
                .readable()
                .await
                .context("Uevent socket became unpollable")?;

            match guard.try_io(|_| self.recv_one()) {
                Ok(Ok(buf)) => {
                    trace!(bytes = buf.len(), "Received uevent datagram");
                    return Ok(normalize(buf));
                }
                Ok(Err(e)) => {
                    return Err(e).context("Failed to read from uevent socket");
                }
                // readiness was stale; poll again
                Err(_would_block) => continue,
            }
        }
    }
}

/// Rewrites a kernel datagram into the line-oriented layout the core parses.
///
/// The kernel's first segment is an `action@devpath` summary; only the
/// device path part becomes the first line (the action is also present as
/// an `ACTION=` field in the body). NUL separators become newlines and
/// trailing padding is dropped.
fn normalize(buf: Vec<u8>) -> Vec<u8> {
    let header_end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    let (header, body) = buf.split_at(header_end);

    let devpath = match header.iter().position(|b| *b == b'@') {
        Some(at) => &header[at + 1..],
        None => header,
    };

    let mut out = Vec::with_capacity(buf.len());
    out.extend_from_slice(devpath);
    for byte in body {
        out.push(if *byte == 0 { b'\n' } else { *byte });
    }
    while out.last() == Some(&b'\n') {
        out.pop();
    }
    out
}
