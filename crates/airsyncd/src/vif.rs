//! VIF config translation.
//!
//! Maps `wifi-iface` sections to presence-flagged VIF state records, with
//! the security block translated between the UCI encryption dialect
//! (`psk2`, `wpa2`, ...) and the schema dialect (`WPA-PSK` + mode, ...).

use crate::error::{AgentError, Result};
use crate::registry::Registry;
use crate::store::{ConfigStore, SectionSnapshot};
use airsync_common::security::*;
use airsync_common::{Presence, VifConfigChanged, VifState};
use std::collections::BTreeMap;

pub const SECTION_WIFI_IFACE: &str = "wifi-iface";

/// Declared attribute schema of a `wifi-iface` section.
#[derive(Debug, Clone, Default)]
pub struct VifSection {
    pub device: Option<String>,
    pub ifname: Option<String>,
    pub mode: Option<String>,
    pub ssid: Option<String>,
    pub disabled: Option<bool>,
    pub network: Option<String>,
    pub encryption: Option<String>,
    pub key: Option<String>,
    pub auth_server: Option<String>,
    pub auth_port: Option<String>,
    pub auth_secret: Option<String>,
}

impl VifSection {
    pub fn parse(s: &SectionSnapshot) -> Self {
        Self {
            device: s.get("device").map(str::to_string),
            ifname: s.get("ifname").map(str::to_string),
            mode: s.get("mode").map(str::to_string),
            ssid: s.get("ssid").map(str::to_string),
            disabled: s.get_bool("disabled"),
            network: s.get("network").map(str::to_string),
            encryption: s.get("encryption").map(str::to_string),
            key: s.get("key").map(str::to_string),
            auth_server: s.get("auth_server").map(str::to_string),
            auth_port: s.get("auth_port").map(str::to_string),
            auth_secret: s.get("auth_secret").map(str::to_string),
        }
    }
}

/// UCI encryption dialect to schema security map.
pub fn security_to_schema(sec: &VifSection) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let set = |map: &mut BTreeMap<String, String>, k: &str, v: &str| {
        map.insert(k.to_string(), v.to_string());
    };

    match sec.encryption.as_deref() {
        None | Some("none") => set(&mut map, SECURITY_ENCRYPTION, ENCRYPTION_OPEN),
        Some("wep") => {
            set(&mut map, SECURITY_ENCRYPTION, ENCRYPTION_WEP);
            set(&mut map, SECURITY_MODE, MODE_WEP128);
            if let Some(key) = &sec.key {
                set(&mut map, SECURITY_KEY, key);
            }
        }
        Some("psk") | Some("psk2") | Some("psk-mixed") => {
            set(&mut map, SECURITY_ENCRYPTION, ENCRYPTION_WPA_PSK);
            let mode = match sec.encryption.as_deref() {
                Some("psk") => MODE_WPA1,
                Some("psk2") => MODE_WPA2,
                _ => MODE_MIXED,
            };
            set(&mut map, SECURITY_MODE, mode);
            if let Some(key) = &sec.key {
                set(&mut map, SECURITY_KEY, key);
            }
        }
        Some("wpa2") => {
            set(&mut map, SECURITY_ENCRYPTION, ENCRYPTION_WPA_EAP);
            set(&mut map, SECURITY_MODE, MODE_WPA2);
            if let Some(ip) = &sec.auth_server {
                set(&mut map, SECURITY_RADIUS_IP, ip);
            }
            if let Some(port) = &sec.auth_port {
                set(&mut map, SECURITY_RADIUS_PORT, port);
            }
            if let Some(secret) = &sec.auth_secret {
                set(&mut map, SECURITY_RADIUS_SECRET, secret);
            }
        }
        Some(_other) => {
            // unknown dialects publish as open rather than invent a mode
            set(&mut map, SECURITY_ENCRYPTION, ENCRYPTION_OPEN);
        }
    }
    map
}

/// Schema security map to UCI section options.
pub fn security_to_uci(security: &BTreeMap<String, String>) -> Result<Vec<(String, String)>> {
    let mut opts: Vec<(String, String)> = Vec::new();
    let mode = security.get(SECURITY_MODE).map(String::as_str);

    match security.get(SECURITY_ENCRYPTION).map(String::as_str) {
        Some(ENCRYPTION_OPEN) | None => {
            opts.push(("encryption".to_string(), "none".to_string()));
        }
        Some(ENCRYPTION_WEP) => {
            opts.push(("encryption".to_string(), "wep".to_string()));
            if let Some(key) = security.get(SECURITY_KEY) {
                opts.push(("key".to_string(), key.clone()));
            }
        }
        Some(ENCRYPTION_WPA_PSK) => {
            let encryption = match mode {
                Some(MODE_WPA1) => "psk",
                Some(MODE_WPA2) | None => "psk2",
                Some(MODE_MIXED) => "psk-mixed",
                Some(other) => {
                    return Err(AgentError::Unsupported(format!("psk mode {}", other)))
                }
            };
            opts.push(("encryption".to_string(), encryption.to_string()));
            if let Some(key) = security.get(SECURITY_KEY) {
                opts.push(("key".to_string(), key.clone()));
            }
        }
        Some(ENCRYPTION_WPA_EAP) => {
            opts.push(("encryption".to_string(), "wpa2".to_string()));
            if let Some(ip) = security.get(SECURITY_RADIUS_IP) {
                opts.push(("auth_server".to_string(), ip.clone()));
            }
            if let Some(port) = security.get(SECURITY_RADIUS_PORT) {
                opts.push(("auth_port".to_string(), port.clone()));
            }
            if let Some(secret) = security.get(SECURITY_RADIUS_SECRET) {
                opts.push(("auth_secret".to_string(), secret.clone()));
            }
        }
        Some(other) => {
            return Err(AgentError::Unsupported(format!("encryption {}", other)));
        }
    }
    Ok(opts)
}

/// Builds the published state record for one VIF section. The registry
/// supplies live facts (address, associated stations) when the kernel
/// interface exists; config-only facts survive without it.
pub fn build_vif_state(
    section: &SectionSnapshot,
    registry: &Registry,
    device_name: &str,
) -> VifState {
    let sec = VifSection::parse(section);
    let mut state = VifState::new(&section.name);

    state.enabled = Presence::Set(!sec.disabled.unwrap_or(false));
    state.mode = sec.mode.clone().into();
    state.ssid = sec.ssid.clone().into();
    state.bridge = sec.network.clone().into();
    state.security = security_to_schema(&sec);

    if let Some(vif) = registry.find_vif(device_name) {
        state.mac = Presence::Set(vif.addr);
        let clients: Vec<_> = vif
            .station_ids()
            .iter()
            .filter_map(|id| registry.station_addr(*id))
            .collect();
        state.associated_clients = Presence::Set(clients);
    }

    state
}

/// Translates the changed fields of a VIF config-set into section options.
pub fn build_vif_options(
    vconf: &VifState,
    changed: &VifConfigChanged,
) -> Result<Vec<(String, String)>> {
    let mut opts: Vec<(String, String)> = Vec::new();

    if changed.enabled {
        let enabled = vconf.enabled.get().copied().unwrap_or(false);
        opts.push(("disabled".to_string(), if enabled { "0" } else { "1" }.to_string()));
    }
    if changed.ssid {
        if let Some(ssid) = vconf.ssid.get() {
            opts.push(("ssid".to_string(), ssid.clone()));
        }
    }
    if changed.bridge {
        if let Some(bridge) = vconf.bridge.get() {
            opts.push(("network".to_string(), bridge.clone()));
        }
    }
    if changed.security {
        opts.extend(security_to_uci(&vconf.security)?);
    }
    Ok(opts)
}

/// Applies a VIF config-set to the persistent store; same store scoping
/// rules as the radio path.
pub fn vif_config_set(
    store: &mut dyn ConfigStore,
    vconf: &VifState,
    changed: &VifConfigChanged,
) -> Result<()> {
    let opts = build_vif_options(vconf, changed)?;

    store.load()?;
    let outcome = store
        .set_options(&vconf.if_name, &opts)
        .and_then(|_| store.commit());
    store.unload();
    outcome
}
