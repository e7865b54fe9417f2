use thiserror::Error;

/// Fatal setup errors. Everything that can go wrong after setup is
/// best-effort by design: logged or counted, never returned to a caller.
#[derive(Debug, Error)]
pub enum QosError {
    #[error("netlink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("generic netlink family '{0}' not found")]
    FamilyNotFound(String),

    #[error("wireless interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("bad MAC address '{0}': expected aa:bb:cc:dd:ee:ff")]
    MacParse(String),

    #[error("no peer given and no associated BSSID on '{0}'; pass the peer MAC explicitly")]
    NoPeer(String),
}
