use std::env;
use std::path::PathBuf;

use crate::mac::Mac;

/// Environment override for the datagram destination path.
pub const SOCK_ENV: &str = "QOS_SOCK";

/// Heartbeat interval used when none is given on the command line.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Collector settings, fixed for the process lifetime.
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Wireless interface to poll (e.g. `wlan0`).
    pub iface: String,
    /// Station to query; `None` means "use the associated BSSID".
    pub peer: Option<Mac>,
    /// Poll period in milliseconds; 0 disables the heartbeat entirely
    /// (the initial immediate poll still happens).
    pub interval_ms: u64,
}

/// Resolve the destination socket path: `$QOS_SOCK` if set, else the
/// per-user default. Publisher and listener must agree, so both call this.
pub fn socket_path() -> PathBuf {
    match env::var(SOCK_ENV) {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/run/user/{uid}/wifi_qos.sock"))
        }
    }
}
