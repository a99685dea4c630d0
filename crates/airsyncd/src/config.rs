//! Daemon configuration.
//!
//! Loads settings from /etc/airsync/agent.toml or falls back to defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/airsync/agent.toml";

/// One logical-name to device-name mapping entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameMapEntry {
    pub logical: String,
    pub device: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Path of the persistent wireless config store.
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Reconciliation tick period in seconds.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Full state refresh runs every Nth tick (or sooner on pending reload).
    #[serde(default = "default_reload_divisor")]
    pub reload_divisor: u32,

    /// Receive timeout for netlink round-trips, milliseconds.
    #[serde(default = "default_netlink_timeout_ms")]
    pub netlink_timeout_ms: u64,

    /// Command run to apply committed config to the running system.
    #[serde(default = "default_apply_command")]
    pub apply_command: String,

    /// Sysfs root used for per-phy temperature lookups.
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,

    /// Driver name advertised in published config records.
    #[serde(default = "default_hw_type")]
    pub hw_type: String,

    /// Logical to device interface name translation table.
    #[serde(default = "default_name_map")]
    pub name_map: Vec<NameMapEntry>,
}

fn default_store_path() -> String {
    "/etc/config/wireless".to_string()
}

fn default_tick_secs() -> u64 {
    1
}

fn default_reload_divisor() -> u32 {
    15
}

fn default_netlink_timeout_ms() -> u64 {
    3000
}

fn default_apply_command() -> String {
    "reload_config".to_string()
}

fn default_sysfs_root() -> String {
    "/sys/class/ieee80211".to_string()
}

fn default_hw_type() -> String {
    "ath10k".to_string()
}

fn default_name_map() -> Vec<NameMapEntry> {
    let pairs = [
        ("home-ap-24", "home_ap_24"),
        ("home-ap-50", "home_ap_50"),
        ("home-ap-l50", "home_ap_l50"),
        ("home-ap-u50", "home_ap_u50"),
        ("wifi0", "phy1"),
        ("wifi1", "phy2"),
        ("wifi2", "phy0"),
    ];
    pairs
        .iter()
        .map(|(l, d)| NameMapEntry {
            logical: l.to_string(),
            device: d.to_string(),
        })
        .collect()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            tick_secs: default_tick_secs(),
            reload_divisor: default_reload_divisor(),
            netlink_timeout_ms: default_netlink_timeout_ms(),
            apply_command: default_apply_command(),
            sysfs_root: default_sysfs_root(),
            hw_type: default_hw_type(),
            name_map: default_name_map(),
        }
    }
}

impl AgentConfig {
    /// Loads from the given path, falling back to defaults if missing or
    /// malformed.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!("No config at {}, using defaults", path);
            return Ok(Self::default());
        }
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(cfg) => {
                    info!("Loaded config from {}", path);
                    Ok(cfg)
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}, using defaults", path, e);
                    Ok(Self::default())
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path, e);
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.tick_secs, 1);
        assert_eq!(cfg.reload_divisor, 15);
        assert_eq!(cfg.apply_command, "reload_config");
        assert_eq!(cfg.name_map.len(), 7);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AgentConfig = toml::from_str("store_path = \"/tmp/wireless\"").unwrap();
        assert_eq!(cfg.store_path, "/tmp/wireless");
        assert_eq!(cfg.reload_divisor, 15);
        assert!(!cfg.name_map.is_empty());
    }
}
