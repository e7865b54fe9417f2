//! Collector service: setup, then a single-threaded reactor over the
//! netlink channel and the heartbeat. Runs until the process dies.

use std::io;

use log::{info, warn};
use tokio::io::unix::AsyncFd;

use crate::config::{CollectorConfig, socket_path};
use crate::diag::SharedDiag;
use crate::error::QosError;
use crate::heartbeat::Heartbeat;
use crate::netlink::NlChannel;
use crate::netlink::msg::consts::NL80211_FAMILY;
use crate::netlink::sock::{GenlSocket, NL80211_GROUPS, associated_bssid, ifindex};
use crate::publisher::Publisher;
use crate::station::{self, StationClient};

/// `GenlSocket` registered with the reactor for readiness.
struct AsyncGenl {
    inner: AsyncFd<GenlSocket>,
}

impl NlChannel for AsyncGenl {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.get_mut().send(buf)
    }

    fn recv_datagrams(&mut self) -> io::Result<Vec<Vec<u8>>> {
        self.inner.get_mut().recv_datagrams()
    }
}

/// Open the kernel channel, resolve the peer, and poll forever.
///
/// Everything up to the first request is fatal on failure; after that
/// the loop degrades rather than exits.
pub async fn run(cfg: CollectorConfig, diag: SharedDiag) -> Result<(), QosError> {
    let mut sock = GenlSocket::open()?;
    let family = sock.resolve_family(NL80211_FAMILY)?;
    sock.join_groups(&family, NL80211_GROUPS);
    sock.set_nonblocking()?;

    let ifidx = ifindex(&cfg.iface)?;
    let peer = station::resolve_peer(cfg.peer, &cfg.iface, || associated_bssid(&cfg.iface))?;

    let dest = socket_path();
    let publisher = Publisher::new(dest.clone(), diag.clone())?;

    let channel = AsyncGenl {
        inner: AsyncFd::new(sock)?,
    };
    let mut client = StationClient::new(channel, family.id, ifidx, peer, diag);
    info!(
        "polling station {} on {} (ifindex {ifidx}), publishing to {}",
        client.peer(),
        cfg.iface,
        dest.display()
    );
    let mut heartbeat = Heartbeat::new(cfg.interval_ms);
    if !heartbeat.enabled() {
        info!("heartbeat disabled; polling once at startup only");
    }

    // First sample should not wait a full period.
    client.request();

    loop {
        tokio::select! {
            readable = async {
                match client.channel_mut().inner.readable_mut().await {
                    Ok(mut guard) => {
                        guard.clear_ready();
                        true
                    }
                    Err(e) => {
                        warn!("netlink poll failed: {e}");
                        false
                    }
                }
            } => {
                if readable {
                    // Drain the whole burst before the next trigger can run.
                    for sample in client.drain() {
                        publisher.publish(&sample);
                    }
                } else {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
            }
            _ = heartbeat.tick() => {
                client.request();
            }
        }
    }
}
