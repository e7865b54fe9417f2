use std::fmt;
use std::str::FromStr;

use crate::error::QosError;

/// Link-layer address of the station being polled.
///
/// Resolved once at startup (explicit argument, or the associated BSSID
/// from the kernel) and immutable for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mac(pub [u8; 6]);

impl FromStr for Mac {
    type Err = QosError;

    /// Parse `aa:bb:cc:dd:ee:ff` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(|| QosError::MacParse(s.into()))?;
            *byte = u8::from_str_radix(part, 16).map_err(|_| QosError::MacParse(s.into()))?;
        }
        if parts.next().is_some() {
            return Err(QosError::MacParse(s.into()));
        }
        Ok(Mac(bytes))
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let mac: Mac = "de:ad:BE:ef:00:1f".parse().unwrap();
        assert_eq!(mac.0, [0xde, 0xad, 0xbe, 0xef, 0x00, 0x1f]);
        assert_eq!(mac.to_string(), "de:ad:be:ef:00:1f");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("de:ad:be:ef:00".parse::<Mac>().is_err());
        assert!("de:ad:be:ef:00:1f:22".parse::<Mac>().is_err());
        assert!("de:ad:be:ef:00:zz".parse::<Mac>().is_err());
        assert!("".parse::<Mac>().is_err());
    }
}
