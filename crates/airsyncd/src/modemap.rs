//! HT/HW mode compatibility table.
//!
//! Bridges the two mode dialects: UCI speaks `hwmode 11g` + `htmode VHT80`,
//! the published schema speaks `hw_mode 11ac` + `ht_mode HT80`. A mode
//! combination with no row here is unsupported and must fail a config
//! write rather than half-apply.

use crate::error::{AgentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEntry {
    /// Schema band this row applies to: "2.4G" or "5G" (covering 5G/5GL/5GU).
    pub band: &'static str,
    pub hw_mode: &'static str,
    pub ht_mode: Option<&'static str>,
    pub uci_hwmode: &'static str,
    pub uci_htmode: Option<&'static str>,
}

const MODE_TABLE: &[ModeEntry] = &[
    ModeEntry { band: "2.4G", hw_mode: "11b", ht_mode: None, uci_hwmode: "11b", uci_htmode: None },
    ModeEntry { band: "2.4G", hw_mode: "11g", ht_mode: None, uci_hwmode: "11g", uci_htmode: None },
    ModeEntry { band: "2.4G", hw_mode: "11n", ht_mode: Some("HT20"), uci_hwmode: "11g", uci_htmode: Some("HT20") },
    ModeEntry { band: "2.4G", hw_mode: "11n", ht_mode: Some("HT40"), uci_hwmode: "11g", uci_htmode: Some("HT40") },
    ModeEntry { band: "5G", hw_mode: "11a", ht_mode: None, uci_hwmode: "11a", uci_htmode: None },
    ModeEntry { band: "5G", hw_mode: "11n", ht_mode: Some("HT20"), uci_hwmode: "11a", uci_htmode: Some("HT20") },
    ModeEntry { band: "5G", hw_mode: "11n", ht_mode: Some("HT40"), uci_hwmode: "11a", uci_htmode: Some("HT40") },
    ModeEntry { band: "5G", hw_mode: "11ac", ht_mode: Some("HT20"), uci_hwmode: "11a", uci_htmode: Some("VHT20") },
    ModeEntry { band: "5G", hw_mode: "11ac", ht_mode: Some("HT40"), uci_hwmode: "11a", uci_htmode: Some("VHT40") },
    ModeEntry { band: "5G", hw_mode: "11ac", ht_mode: Some("HT80"), uci_hwmode: "11a", uci_htmode: Some("VHT80") },
    ModeEntry { band: "5G", hw_mode: "11ac", ht_mode: Some("HT160"), uci_hwmode: "11a", uci_htmode: Some("VHT160") },
];

fn band_matches(row_band: &str, freq_band: &str) -> bool {
    match row_band {
        "5G" => freq_band.starts_with('5'),
        other => other == freq_band,
    }
}

/// Resolves the schema-dialect mode for a UCI htmode/hwmode pair.
///
/// Returns `(hw_mode, ht_mode)`; `ht_mode` is `None` for pre-HT modes.
pub fn to_schema(uci_htmode: Option<&str>, uci_hwmode: &str) -> Result<(&'static str, Option<&'static str>)> {
    MODE_TABLE
        .iter()
        .find(|m| m.uci_hwmode == uci_hwmode && m.uci_htmode.as_deref() == uci_htmode)
        .map(|m| (m.hw_mode, m.ht_mode))
        .ok_or_else(|| {
            AgentError::Unsupported(format!(
                "htmode {:?} hwmode {}",
                uci_htmode, uci_hwmode
            ))
        })
}

/// Resolves the UCI-dialect mode for a schema band/ht/hw triple.
///
/// Returns `(uci_htmode, uci_hwmode)`.
pub fn to_uci(freq_band: &str, ht_mode: Option<&str>, hw_mode: &str) -> Result<(Option<&'static str>, &'static str)> {
    MODE_TABLE
        .iter()
        .find(|m| {
            band_matches(m.band, freq_band)
                && m.hw_mode == hw_mode
                && m.ht_mode.as_deref() == ht_mode
        })
        .map(|m| (m.uci_htmode, m.uci_hwmode))
        .ok_or_else(|| {
            AgentError::Unsupported(format!(
                "band {} ht_mode {:?} hw_mode {}",
                freq_band, ht_mode, hw_mode
            ))
        })
}
