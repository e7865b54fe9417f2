//! Minimal generic-netlink plumbing: enough to resolve the nl80211
//! family, join its multicast groups, and exchange station-statistics
//! messages. Not a general netlink client.

pub mod msg;

#[cfg(target_os = "linux")]
pub mod sock;

use std::io;

/// The kernel channel as seen by the stats client. The real
/// implementation is [`sock::GenlSocket`]; tests inject a fake that
/// replays canned reply datagrams.
pub trait NlChannel {
    /// Queue one fully built netlink message for the kernel.
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Drain all datagrams currently readable, without blocking.
    fn recv_datagrams(&mut self) -> io::Result<Vec<Vec<u8>>>;
}
