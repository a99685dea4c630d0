//! 6-byte hardware address.
//!
//! Used as the identity of stations and the address of VIFs. Serializes as
//! the usual colon-separated hex form so published records stay readable.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("invalid MAC address: {0}")]
pub struct MacParseError(String);

/// A 6-byte IEEE 802 hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Builds from a raw attribute payload, rejecting wrong lengths.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MacParseError> {
        if bytes.len() != 6 {
            return Err(MacParseError(format!("{} bytes", bytes.len())));
        }
        let mut octets = [0u8; 6];
        octets.copy_from_slice(bytes);
        Ok(MacAddr(octets))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 6]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in s.split(':') {
            if count == 6 || part.len() != 2 {
                return Err(MacParseError(s.to_string()));
            }
            octets[count] =
                u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.to_string()))?;
            count += 1;
        }
        if count != 6 {
            return Err(MacParseError(s.to_string()));
        }
        Ok(MacAddr(octets))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mac: MacAddr = "a4:17:31:00:ff:08".parse().unwrap();
        assert_eq!(mac.octets(), [0xa4, 0x17, 0x31, 0x00, 0xff, 0x08]);
        assert_eq!(mac.to_string(), "a4:17:31:00:ff:08");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("a4:17:31:00:ff".parse::<MacAddr>().is_err());
        assert!("a4:17:31:00:ff:08:99".parse::<MacAddr>().is_err());
        assert!("zz:17:31:00:ff:08".parse::<MacAddr>().is_err());
        assert!(MacAddr::from_slice(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let mac: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:11:22:33:44:55\"");
        let back: MacAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
