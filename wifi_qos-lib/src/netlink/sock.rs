//! Raw generic-netlink socket plus the two small kernel queries the
//! collector needs at setup: nl80211 family resolution and the
//! wireless-extensions BSSID ioctl.

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use log::{info, warn};

use crate::error::QosError;
use crate::mac::Mac;
use crate::netlink::NlChannel;
use crate::netlink::msg::{self, GenlRequest, consts};

const RECV_BUF: usize = 8192;

/// Multicast groups worth listening to; membership is opportunistic and
/// a missing group only costs us event-driven wakeups.
pub const NL80211_GROUPS: &[&str] = &["mlme", "station", "stats"];

fn last_err() -> io::Error {
    io::Error::last_os_error()
}

/// Non-blocking `NETLINK_GENERIC` socket with sequence numbering.
pub struct GenlSocket {
    fd: OwnedFd,
    seq: u32,
}

impl GenlSocket {
    /// Open and bind; the socket starts blocking so setup queries can
    /// just `recv`, and is switched to non-blocking once setup is done.
    pub fn open() -> io::Result<Self> {
        let raw = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                libc::NETLINK_GENERIC,
            )
        };
        if raw < 0 {
            return Err(last_err());
        }
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(last_err());
        }
        Ok(Self { fd, seq: 1 })
    }

    fn next_seq(&mut self) -> u32 {
        let s = self.seq;
        self.seq = self.seq.wrapping_add(1);
        s
    }

    fn send_raw(&self, buf: &[u8]) -> io::Result<()> {
        let rc = unsafe { libc::send(self.fd.as_raw_fd(), buf.as_ptr().cast(), buf.len(), 0) };
        if rc < 0 { Err(last_err()) } else { Ok(()) }
    }

    fn recv_raw(&self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; RECV_BUF];
        loop {
            let rc = unsafe { libc::recv(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len(), 0) };
            if rc >= 0 {
                buf.truncate(rc as usize);
                return Ok(buf);
            }
            let err = last_err();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    /// Resolve a generic-netlink family id and its multicast groups.
    pub fn resolve_family(&mut self, name: &str) -> Result<FamilyInfo, QosError> {
        let seq = self.next_seq();
        let req = GenlRequest::new(consts::GENL_ID_CTRL, consts::CTRL_CMD_GETFAMILY, 1, seq)
            .attr_str(consts::CTRL_ATTR_FAMILY_NAME, name)
            .build();
        self.send_raw(&req)?;

        let datagram = self.recv_raw()?;
        for nl in msg::messages(&datagram) {
            if let Some(code) = nl.error_code() {
                if code != 0 {
                    return Err(QosError::FamilyNotFound(name.into()));
                }
                continue;
            }
            if nl.ty != consts::GENL_ID_CTRL {
                continue;
            }
            let Some((_, block)) = msg::genl_payload(nl.payload) else {
                continue;
            };
            let Some(id) = msg::attr_u16(block, consts::CTRL_ATTR_FAMILY_ID) else {
                continue;
            };
            let mut groups = Vec::new();
            if let Some(grp_block) = msg::find_attr(block, consts::CTRL_ATTR_MCAST_GROUPS) {
                for (_, entry) in msg::attrs(grp_block) {
                    let name = msg::find_attr(entry, consts::CTRL_ATTR_MCAST_GRP_NAME)
                        .map(|p| String::from_utf8_lossy(p.strip_suffix(&[0]).unwrap_or(p)).into_owned());
                    let gid = msg::attr_u32(entry, consts::CTRL_ATTR_MCAST_GRP_ID);
                    if let (Some(name), Some(gid)) = (name, gid) {
                        groups.push((name, gid));
                    }
                }
            }
            return Ok(FamilyInfo { id, groups });
        }
        Err(QosError::FamilyNotFound(name.into()))
    }

    /// Join the named multicast groups where present. Best-effort: a
    /// group the kernel does not expose is logged and skipped.
    pub fn join_groups(&self, family: &FamilyInfo, wanted: &[&str]) {
        for name in wanted {
            match family.groups.iter().find(|(n, _)| n == name) {
                Some((_, gid)) => {
                    let rc = unsafe {
                        libc::setsockopt(
                            self.fd.as_raw_fd(),
                            libc::SOL_NETLINK,
                            libc::NETLINK_ADD_MEMBERSHIP,
                            gid as *const u32 as *const libc::c_void,
                            mem::size_of::<u32>() as libc::socklen_t,
                        )
                    };
                    if rc < 0 {
                        warn!("could not join multicast group '{name}': {}", last_err());
                    } else {
                        info!("joined multicast group '{name}' (id {gid})");
                    }
                }
                None => warn!("multicast group '{name}' not exposed by kernel"),
            }
        }
    }

    /// Switch to non-blocking mode for the steady-state drain loop.
    pub fn set_nonblocking(&self) -> io::Result<()> {
        let fd = self.fd.as_raw_fd();
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(last_err());
        }
        let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
        if rc < 0 { Err(last_err()) } else { Ok(()) }
    }

}

impl AsRawFd for GenlSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl NlChannel for GenlSocket {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.send_raw(buf)
    }

    /// Drain every datagram currently queued on the socket. `EINTR`
    /// resumes, `EWOULDBLOCK` ends the drain; other errors only surface
    /// when nothing was read at all.
    fn recv_datagrams(&mut self) -> io::Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        loop {
            let mut buf = vec![0u8; RECV_BUF];
            let rc = unsafe { libc::recv(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len(), 0) };
            if rc >= 0 {
                buf.truncate(rc as usize);
                out.push(buf);
                continue;
            }
            let err = last_err();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => break,
                _ if !out.is_empty() => break,
                _ => return Err(err),
            }
        }
        Ok(out)
    }
}

/// Resolved generic-netlink family: numeric id plus multicast groups.
#[derive(Debug)]
pub struct FamilyInfo {
    pub id: u16,
    pub groups: Vec<(String, u32)>,
}

/// Interface name → kernel ifindex.
pub fn ifindex(iface: &str) -> Result<u32, QosError> {
    let name = CString::new(iface).map_err(|_| QosError::InterfaceNotFound(iface.into()))?;
    let idx = unsafe { libc::if_nametoindex(name.as_ptr()) };
    if idx == 0 {
        Err(QosError::InterfaceNotFound(iface.into()))
    } else {
        Ok(idx)
    }
}

// Wireless-extensions SIOCGIWAP request: interface name + sockaddr union.
const SIOCGIWAP: libc::c_ulong = 0x8B15;

#[repr(C)]
struct IwReq {
    ifr_name: [u8; libc::IFNAMSIZ],
    sa_family: u16,
    sa_data: [u8; 14],
}

/// BSSID of the currently associated access point, `None` when the
/// interface is not associated (all-zero / all-ff address).
pub fn associated_bssid(iface: &str) -> io::Result<Option<Mac>> {
    let raw = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
    if raw < 0 {
        return Err(last_err());
    }
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    let mut req: IwReq = unsafe { mem::zeroed() };
    let name = iface.as_bytes();
    if name.len() >= libc::IFNAMSIZ {
        return Ok(None);
    }
    req.ifr_name[..name.len()].copy_from_slice(name);

    let rc = unsafe { libc::ioctl(fd.as_raw_fd(), SIOCGIWAP, &mut req as *mut IwReq) };
    if rc < 0 {
        return Err(last_err());
    }
    let mut addr = [0u8; 6];
    addr.copy_from_slice(&req.sa_data[0..6]);
    let mac = Mac(addr);
    if mac.0 == [0; 6] || mac.0 == [0xff; 6] {
        Ok(None)
    } else {
        Ok(Some(mac))
    }
}
