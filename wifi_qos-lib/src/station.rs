//! Station-statistics client: issues `GET_STATION` requests for one
//! peer on one interface and turns the kernel's replies into samples.

use chrono::Utc;
use log::{debug, warn};

use crate::diag::SharedDiag;
use crate::mac::Mac;
use crate::netlink::NlChannel;
use crate::netlink::msg::{self, GenlRequest, consts};
use crate::wire::QosSample;

/// Single-outstanding-request client over an injected kernel channel.
///
/// Correlation between request and reply is implicit (nl80211 replies
/// carry no request id we use), so the client keeps an explicit
/// `awaiting_reply` flag instead of relying on ordering assumptions.
pub struct StationClient<C: NlChannel> {
    channel: C,
    family: u16,
    ifindex: u32,
    peer: Mac,
    awaiting_reply: bool,
    seq: u32,
    diag: SharedDiag,
}

impl<C: NlChannel> StationClient<C> {
    pub fn new(channel: C, family: u16, ifindex: u32, peer: Mac, diag: SharedDiag) -> Self {
        Self {
            channel,
            family,
            ifindex,
            peer,
            awaiting_reply: false,
            seq: 1,
            diag,
        }
    }

    pub fn peer(&self) -> Mac {
        self.peer
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Issue one `GET_STATION` request. Fire-and-forget: a send failure
    /// is logged and the next heartbeat retries. If the previous reply
    /// never arrived we re-send rather than pipeline a second request.
    pub fn request(&mut self) {
        if self.awaiting_reply {
            debug!("previous station reply still outstanding, re-requesting");
        }
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        let req = GenlRequest::new(self.family, consts::NL80211_CMD_GET_STATION, 0, seq)
            .attr_u32(consts::NL80211_ATTR_IFINDEX, self.ifindex)
            .attr(consts::NL80211_ATTR_MAC, &self.peer.0)
            .build();
        match self.channel.send(&req) {
            Ok(()) => self.awaiting_reply = true,
            Err(e) => warn!("station request send failed: {e}"),
        }
    }

    /// Drain everything readable on the channel and parse station
    /// replies, in arrival order. Messages that are not a station reply
    /// are expected chatter (multicast events, ACKs) and skipped
    /// silently; channel errors are logged and yield an empty batch.
    pub fn drain(&mut self) -> Vec<QosSample> {
        let datagrams = match self.channel.recv_datagrams() {
            Ok(d) => d,
            Err(e) => {
                warn!("netlink recv failed: {e}");
                return Vec::new();
            }
        };

        let mut samples = Vec::new();
        for datagram in &datagrams {
            for nl in msg::messages(datagram) {
                match self.parse_station_reply(&nl) {
                    Some(sample) => {
                        self.awaiting_reply = false;
                        samples.push(sample);
                    }
                    None => self.diag.frame_skipped(),
                }
            }
        }
        samples
    }

    /// One netlink message → one sample, or `None` for anything that is
    /// not a `NEW_STATION` reply with station info. Fields the kernel
    /// omits are reported as zero, not as an error.
    fn parse_station_reply(&self, nl: &msg::NlMsg<'_>) -> Option<QosSample> {
        if nl.ty != self.family {
            return None;
        }
        let (cmd, block) = msg::genl_payload(nl.payload)?;
        if cmd != consts::NL80211_CMD_NEW_STATION {
            return None;
        }
        let sta = msg::find_attr(block, consts::NL80211_ATTR_STA_INFO)?;

        // Capture time is ours, not the kernel's.
        let ts_ns = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;

        let rssi_dbm = msg::find_attr(sta, consts::NL80211_STA_INFO_SIGNAL)
            .and_then(|p| p.first())
            .map(|&b| b as i8 as i32)
            .unwrap_or_default();

        Some(QosSample {
            ts_ns,
            rssi_dbm,
            tx_ok: msg::attr_u32(sta, consts::NL80211_STA_INFO_TX_PACKETS).unwrap_or_default(),
            tx_retry: msg::attr_u32(sta, consts::NL80211_STA_INFO_TX_RETRIES).unwrap_or_default(),
            tx_fail: msg::attr_u32(sta, consts::NL80211_STA_INFO_TX_FAILED).unwrap_or_default(),
        })
    }
}

/// Pick the station to poll: the explicit argument wins, else whatever
/// peer `lookup` reports the interface is associated with. No peer from
/// either source is a fatal setup error; the collector cannot guess.
pub fn resolve_peer(
    explicit: Option<Mac>,
    iface: &str,
    lookup: impl FnOnce() -> std::io::Result<Option<Mac>>,
) -> Result<Mac, crate::error::QosError> {
    if let Some(mac) = explicit {
        return Ok(mac);
    }
    lookup()
        .unwrap_or(None)
        .ok_or_else(|| crate::error::QosError::NoPeer(iface.into()))
}
