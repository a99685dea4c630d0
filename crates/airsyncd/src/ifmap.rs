//! Logical to device interface name translation.
//!
//! Northbound callers speak in logical names ("wifi0"); the kernel wants
//! device names ("phy1"). The table is fixed at startup from config.

use crate::config::NameMapEntry;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct IfMap {
    fwd: BTreeMap<String, String>,
    rev: BTreeMap<String, String>,
}

impl IfMap {
    pub fn from_entries(entries: &[NameMapEntry]) -> Self {
        let mut map = IfMap::default();
        for e in entries {
            map.insert(&e.logical, &e.device);
        }
        map
    }

    pub fn insert(&mut self, logical: &str, device: &str) {
        self.fwd.insert(logical.to_string(), device.to_string());
        self.rev.insert(device.to_string(), logical.to_string());
    }

    /// Maps a logical name to its device name; unmapped names pass through.
    pub fn to_device<'a>(&'a self, logical: &'a str) -> &'a str {
        self.fwd.get(logical).map(String::as_str).unwrap_or(logical)
    }

    /// Maps a device name back to its logical name; unmapped names pass
    /// through.
    pub fn to_logical<'a>(&'a self, device: &'a str) -> &'a str {
        self.rev.get(device).map(String::as_str).unwrap_or(device)
    }
}
