//! Generic netlink message building and parsing.
//!
//! Only what the collector needs: a request builder (nlmsghdr +
//! genlmsghdr + flat attributes) and walkers for the reply side,
//! including nested attribute blocks. Everything here is pure and
//! socket-free so it can be tested against hand-built buffers.

/// netlink / generic-netlink constants, from `linux/netlink.h`,
/// `linux/genetlink.h` and `linux/nl80211.h`.
pub mod consts {
    pub const NLMSG_ERROR: u16 = 2;
    pub const NLMSG_DONE: u16 = 3;
    pub const NLM_F_REQUEST: u16 = 1;

    pub const GENL_ID_CTRL: u16 = 0x10;
    pub const CTRL_CMD_GETFAMILY: u8 = 3;
    pub const CTRL_ATTR_FAMILY_ID: u16 = 1;
    pub const CTRL_ATTR_FAMILY_NAME: u16 = 2;
    pub const CTRL_ATTR_MCAST_GROUPS: u16 = 7;
    pub const CTRL_ATTR_MCAST_GRP_NAME: u16 = 1;
    pub const CTRL_ATTR_MCAST_GRP_ID: u16 = 2;

    pub const NL80211_FAMILY: &str = "nl80211";
    pub const NL80211_CMD_GET_STATION: u8 = 17;
    pub const NL80211_CMD_NEW_STATION: u8 = 19;
    pub const NL80211_ATTR_IFINDEX: u16 = 3;
    pub const NL80211_ATTR_MAC: u16 = 6;
    pub const NL80211_ATTR_STA_INFO: u16 = 21;
    pub const NL80211_STA_INFO_SIGNAL: u16 = 7;
    pub const NL80211_STA_INFO_TX_PACKETS: u16 = 10;
    pub const NL80211_STA_INFO_TX_RETRIES: u16 = 11;
    pub const NL80211_STA_INFO_TX_FAILED: u16 = 12;
}

const NLMSG_HDRLEN: usize = 16;
const GENL_HDRLEN: usize = 4;
const NLA_HDRLEN: usize = 4;

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Builder for one generic-netlink request message.
pub struct GenlRequest {
    buf: Vec<u8>,
}

impl GenlRequest {
    /// Start a request to `family` with the given genl command. The
    /// sender leaves `nlmsg_pid` zero; the kernel fills in addressing.
    pub fn new(family: u16, cmd: u8, version: u8, seq: u32) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&0u32.to_ne_bytes()); // length, patched in build()
        buf.extend_from_slice(&family.to_ne_bytes());
        buf.extend_from_slice(&consts::NLM_F_REQUEST.to_ne_bytes());
        buf.extend_from_slice(&seq.to_ne_bytes());
        buf.extend_from_slice(&0u32.to_ne_bytes()); // pid
        buf.push(cmd);
        buf.push(version);
        buf.extend_from_slice(&0u16.to_ne_bytes()); // reserved
        Self { buf }
    }

    /// Append one attribute, padding the payload to 4 bytes.
    pub fn attr(mut self, ty: u16, payload: &[u8]) -> Self {
        let nla_len = (NLA_HDRLEN + payload.len()) as u16;
        self.buf.extend_from_slice(&nla_len.to_ne_bytes());
        self.buf.extend_from_slice(&ty.to_ne_bytes());
        self.buf.extend_from_slice(payload);
        let pad = align4(payload.len()) - payload.len();
        self.buf.extend_from_slice(&[0u8; 3][..pad]);
        self
    }

    pub fn attr_u32(self, ty: u16, value: u32) -> Self {
        self.attr(ty, &value.to_ne_bytes())
    }

    /// NUL-terminated string attribute, as genl control expects.
    pub fn attr_str(self, ty: u16, value: &str) -> Self {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.attr(ty, &payload)
    }

    /// Patch the total length and hand back the wire bytes.
    pub fn build(mut self) -> Vec<u8> {
        let len = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        self.buf
    }
}

/// One netlink message lifted out of a received datagram.
#[derive(Debug)]
pub struct NlMsg<'a> {
    pub ty: u16,
    pub payload: &'a [u8],
}

impl NlMsg<'_> {
    /// For `NLMSG_ERROR` messages: the negative errno carried in the
    /// payload (0 means ACK).
    pub fn error_code(&self) -> Option<i32> {
        if self.ty != consts::NLMSG_ERROR || self.payload.len() < 4 {
            return None;
        }
        Some(i32::from_ne_bytes(self.payload[0..4].try_into().ok()?))
    }
}

/// Walk the (possibly multi-part) netlink messages in one datagram.
/// Truncated trailers are dropped rather than reported — a shared
/// netlink channel carries chatter we have no stake in.
pub fn messages(buf: &[u8]) -> impl Iterator<Item = NlMsg<'_>> {
    let mut rest = buf;
    std::iter::from_fn(move || {
        if rest.len() < NLMSG_HDRLEN {
            return None;
        }
        let len = u32::from_ne_bytes(rest[0..4].try_into().ok()?) as usize;
        if len < NLMSG_HDRLEN || len > rest.len() {
            return None;
        }
        let ty = u16::from_ne_bytes(rest[4..6].try_into().ok()?);
        let payload = &rest[NLMSG_HDRLEN..len];
        rest = &rest[align4(len).min(rest.len())..];
        Some(NlMsg { ty, payload })
    })
}

/// Split a genl payload into (command, attribute block).
pub fn genl_payload(payload: &[u8]) -> Option<(u8, &[u8])> {
    if payload.len() < GENL_HDRLEN {
        return None;
    }
    Some((payload[0], &payload[GENL_HDRLEN..]))
}

/// Walk a flat attribute block, nested blocks included (a nested
/// attribute's payload is itself a valid block for this walker).
pub fn attrs(block: &[u8]) -> impl Iterator<Item = (u16, &[u8])> {
    let mut rest = block;
    std::iter::from_fn(move || {
        if rest.len() < NLA_HDRLEN {
            return None;
        }
        let nla_len = u16::from_ne_bytes(rest[0..2].try_into().ok()?) as usize;
        if nla_len < NLA_HDRLEN || nla_len > rest.len() {
            return None;
        }
        // Mask off NLA_F_NESTED / NLA_F_NET_BYTEORDER.
        let ty = u16::from_ne_bytes(rest[2..4].try_into().ok()?) & 0x3fff;
        let payload = &rest[NLA_HDRLEN..nla_len];
        rest = &rest[align4(nla_len).min(rest.len())..];
        Some((ty, payload))
    })
}

/// First attribute of the given type in a block, if present.
pub fn find_attr(block: &[u8], ty: u16) -> Option<&[u8]> {
    attrs(block).find(|(t, _)| *t == ty).map(|(_, p)| p)
}

pub fn attr_u16(block: &[u8], ty: u16) -> Option<u16> {
    let p = find_attr(block, ty)?;
    Some(u16::from_ne_bytes(p.get(0..2)?.try_into().ok()?))
}

pub fn attr_u32(block: &[u8], ty: u16) -> Option<u32> {
    let p = find_attr(block, ty)?;
    Some(u32::from_ne_bytes(p.get(0..4)?.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::consts::*;
    use super::*;

    #[test]
    fn request_layout() {
        let msg = GenlRequest::new(0x1c, NL80211_CMD_GET_STATION, 0, 7)
            .attr_u32(NL80211_ATTR_IFINDEX, 3)
            .attr(NL80211_ATTR_MAC, &[1, 2, 3, 4, 5, 6])
            .build();

        // nlmsghdr
        assert_eq!(u32::from_ne_bytes(msg[0..4].try_into().unwrap()) as usize, msg.len());
        assert_eq!(u16::from_ne_bytes(msg[4..6].try_into().unwrap()), 0x1c);
        assert_eq!(u16::from_ne_bytes(msg[6..8].try_into().unwrap()), NLM_F_REQUEST);
        assert_eq!(u32::from_ne_bytes(msg[8..12].try_into().unwrap()), 7);
        // genlmsghdr
        assert_eq!(msg[16], NL80211_CMD_GET_STATION);

        // attributes parse back, MAC payload padded to 4 but sized 6
        let (cmd, block) = genl_payload(&msg[16..]).unwrap();
        assert_eq!(cmd, NL80211_CMD_GET_STATION);
        assert_eq!(attr_u32(block, NL80211_ATTR_IFINDEX), Some(3));
        assert_eq!(find_attr(block, NL80211_ATTR_MAC), Some(&[1u8, 2, 3, 4, 5, 6][..]));
    }

    #[test]
    fn string_attr_is_nul_terminated() {
        let msg = GenlRequest::new(GENL_ID_CTRL, CTRL_CMD_GETFAMILY, 1, 1)
            .attr_str(CTRL_ATTR_FAMILY_NAME, NL80211_FAMILY)
            .build();
        let (_, block) = genl_payload(&msg[16..]).unwrap();
        assert_eq!(find_attr(block, CTRL_ATTR_FAMILY_NAME), Some(&b"nl80211\0"[..]));
    }

    #[test]
    fn multipart_datagram_walks_all_messages() {
        let a = GenlRequest::new(0x1c, 1, 0, 1).build();
        let b = GenlRequest::new(0x1d, 2, 0, 2).build();
        let mut datagram = a.clone();
        datagram.extend_from_slice(&b);

        let types: Vec<u16> = messages(&datagram).map(|m| m.ty).collect();
        assert_eq!(types, vec![0x1c, 0x1d]);
    }

    #[test]
    fn truncated_message_is_dropped() {
        let mut msg = GenlRequest::new(0x1c, 1, 0, 1).build();
        msg.truncate(msg.len() - 1);
        assert_eq!(messages(&msg).count(), 0);
    }

    #[test]
    fn error_message_carries_errno() {
        let mut buf = Vec::new();
        let payload_len = 4 + 16; // errno + echoed request header
        buf.extend_from_slice(&((16 + payload_len) as u32).to_ne_bytes());
        buf.extend_from_slice(&NLMSG_ERROR.to_ne_bytes());
        buf.extend_from_slice(&0u16.to_ne_bytes());
        buf.extend_from_slice(&1u32.to_ne_bytes());
        buf.extend_from_slice(&0u32.to_ne_bytes());
        buf.extend_from_slice(&(-2i32).to_ne_bytes()); // -ENOENT
        buf.extend_from_slice(&[0u8; 16]);

        let msg = messages(&buf).next().unwrap();
        assert_eq!(msg.error_code(), Some(-2));
    }

    #[test]
    fn nested_block_reuses_walker() {
        // Outer block: one nested attribute whose payload is an inner block.
        let inner = GenlRequest::new(0, 0, 0, 0)
            .attr_u32(NL80211_STA_INFO_TX_PACKETS, 50)
            .build();
        let inner_block = &inner[20..]; // skip nlmsghdr + genlmsghdr
        let outer = GenlRequest::new(0, 0, 0, 0)
            .attr(NL80211_ATTR_STA_INFO, inner_block)
            .build();
        let outer_block = &outer[20..];

        let sta = find_attr(outer_block, NL80211_ATTR_STA_INFO).unwrap();
        assert_eq!(attr_u32(sta, NL80211_STA_INFO_TX_PACKETS), Some(50));
    }
}
