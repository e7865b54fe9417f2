use serde::{Deserialize, Serialize};

/// Exact size of one encoded sample on the datagram channel.
pub const SAMPLE_LEN: usize = 24;

/// One timestamped snapshot of link quality for the polled station.
///
/// On the wire this is exactly 24 bytes, little-endian:
/// `ts_ns(8) | rssi_dbm(4) | tx_ok(4) | tx_retry(4) | tx_fail(4)`.
/// There is no version tag and no checksum — any 24-byte datagram decodes,
/// so the format cannot be evolved in place without breaking consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosSample {
    /// Wall-clock capture time, nanoseconds since the Unix epoch.
    pub ts_ns: u64,
    /// Kernel-reported receive signal strength of the peer link, dBm.
    pub rssi_dbm: i32,
    /// Cumulative successful transmissions since association.
    pub tx_ok: u32,
    /// Cumulative retried transmissions since association.
    pub tx_retry: u32,
    /// Cumulative failed transmissions since association.
    pub tx_fail: u32,
}

impl QosSample {
    /// Serialize into the fixed 24-byte wire layout.
    pub fn encode(&self) -> [u8; SAMPLE_LEN] {
        let mut buf = [0u8; SAMPLE_LEN];
        buf[0..8].copy_from_slice(&self.ts_ns.to_le_bytes());
        buf[8..12].copy_from_slice(&self.rssi_dbm.to_le_bytes());
        buf[12..16].copy_from_slice(&self.tx_ok.to_le_bytes());
        buf[16..20].copy_from_slice(&self.tx_retry.to_le_bytes());
        buf[20..24].copy_from_slice(&self.tx_fail.to_le_bytes());
        buf
    }

    /// Parse a datagram payload. Length != 24 is the sole rejection
    /// criterion; field values are trusted as-is.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != SAMPLE_LEN {
            return None;
        }
        Some(Self {
            ts_ns: u64::from_le_bytes(buf[0..8].try_into().ok()?),
            rssi_dbm: i32::from_le_bytes(buf[8..12].try_into().ok()?),
            tx_ok: u32::from_le_bytes(buf[12..16].try_into().ok()?),
            tx_retry: u32::from_le_bytes(buf[16..20].try_into().ok()?),
            tx_fail: u32::from_le_bytes(buf[20..24].try_into().ok()?),
        })
    }

    /// Share of successful transmissions among all attempted, in percent.
    /// Defined as 0 when no transmissions were attempted.
    pub fn efficiency(&self) -> f64 {
        let total = self.tx_ok as u64 + self.tx_retry as u64 + self.tx_fail as u64;
        if total == 0 {
            0.0
        } else {
            self.tx_ok as f64 / total as f64 * 100.0
        }
    }
}
