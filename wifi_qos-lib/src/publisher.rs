//! Best-effort sample fan-out over a local datagram socket.

use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;

use crate::diag::SharedDiag;
use crate::wire::QosSample;

/// Pure sender toward the configured destination path. Never binds a
/// local address and never requires the destination to exist; with no
/// listener bound, samples are simply lost.
pub struct Publisher {
    sock: UnixDatagram,
    path: PathBuf,
    diag: SharedDiag,
}

impl Publisher {
    /// Creating the socket itself is the only fatal step.
    pub fn new(path: PathBuf, diag: SharedDiag) -> io::Result<Self> {
        let sock = UnixDatagram::unbound()?;
        Ok(Self { sock, path, diag })
    }

    /// Encode and send one sample. Delivery failure is counted and
    /// otherwise ignored: losing a sample is acceptable, losing the
    /// service is not.
    pub fn publish(&self, sample: &QosSample) {
        match self.sock.send_to(&sample.encode(), &self.path) {
            Ok(_) => self.diag.sample_sent(),
            Err(_) => self.diag.publish_dropped(),
        }
    }
}
