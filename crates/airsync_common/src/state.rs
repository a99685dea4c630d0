//! Presence-flagged state and config records for radios and VIFs.
//!
//! These are the records published northbound after each reconciliation
//! pass. Every optional field is a [`Presence`] so a partial update only
//! touches what the pass actually computed.

use crate::mac::MacAddr;
use crate::presence::Presence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of one physical radio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioState {
    pub if_name: String,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub enabled: Presence<bool>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub channel: Presence<u32>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub tx_power: Presence<u32>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub bcn_int: Presence<u32>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub ht_mode: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub hw_mode: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub freq_band: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub country: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub tx_chainmask: Presence<u32>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub allowed_channels: Presence<Vec<u32>>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub mac: Presence<MacAddr>,
    /// Driver name, only carried on config records.
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub hw_type: Presence<String>,
    /// Free-form hardware knobs (DFS toggles and the like).
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub hw_config: BTreeMap<String, String>,
}

impl RadioState {
    pub fn new(if_name: &str) -> Self {
        Self {
            if_name: if_name.to_string(),
            enabled: Presence::Unset,
            channel: Presence::Unset,
            tx_power: Presence::Unset,
            bcn_int: Presence::Unset,
            ht_mode: Presence::Unset,
            hw_mode: Presence::Unset,
            freq_band: Presence::Unset,
            country: Presence::Unset,
            tx_chainmask: Presence::Unset,
            allowed_channels: Presence::Unset,
            mac: Presence::Unset,
            hw_type: Presence::Unset,
            hw_config: BTreeMap::new(),
        }
    }
}

/// Per-field changed mask accompanying a radio config-set request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RadioConfigChanged {
    pub enabled: bool,
    pub channel: bool,
    pub tx_power: bool,
    pub tx_chainmask: bool,
    pub bcn_int: bool,
    pub country: bool,
    pub ht_mode: bool,
    pub hw_mode: bool,
    pub freq_band: bool,
}

/// State of one virtual interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VifState {
    pub if_name: String,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub enabled: Presence<bool>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub mode: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub ssid: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub bridge: Presence<String>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub mac: Presence<MacAddr>,
    #[serde(skip_serializing_if = "Presence::is_unset", default)]
    pub associated_clients: Presence<Vec<MacAddr>>,
    /// Security settings in the schema dialect (see [`crate::security`]).
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub security: BTreeMap<String, String>,
}

impl VifState {
    pub fn new(if_name: &str) -> Self {
        Self {
            if_name: if_name.to_string(),
            enabled: Presence::Unset,
            mode: Presence::Unset,
            ssid: Presence::Unset,
            bridge: Presence::Unset,
            mac: Presence::Unset,
            associated_clients: Presence::Unset,
            security: BTreeMap::new(),
        }
    }
}

/// Per-field changed mask accompanying a VIF config-set request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VifConfigChanged {
    pub enabled: bool,
    pub ssid: bool,
    pub bridge: bool,
    pub security: bool,
}
