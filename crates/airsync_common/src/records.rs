//! Stats record types produced by on-demand radio queries.

use crate::mac::MacAddr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical band a radio serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioType {
    #[serde(rename = "2.4G")]
    Band2G,
    #[serde(rename = "5G")]
    Band5G,
    #[serde(rename = "5GL")]
    Band5GL,
    #[serde(rename = "5GU")]
    Band5GU,
}

impl RadioType {
    /// Schema spelling of the band, as carried in `freq_band` fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            RadioType::Band2G => "2.4G",
            RadioType::Band5G => "5G",
            RadioType::Band5GL => "5GL",
            RadioType::Band5GU => "5GU",
        }
    }

    pub fn from_band_str(s: &str) -> Option<Self> {
        match s {
            "2.4G" => Some(RadioType::Band2G),
            "5G" => Some(RadioType::Band5G),
            "5GL" => Some(RadioType::Band5GL),
            "5GU" => Some(RadioType::Band5GU),
            _ => None,
        }
    }

    pub fn is_5g(&self) -> bool {
        !matches!(self, RadioType::Band2G)
    }
}

/// Kind of channel sweep a scan request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    /// Stay on the serving channel.
    OnChannel,
    /// Visit the requested foreign channels.
    OffChannel,
    /// Sweep everything the radio allows.
    Full,
}

/// One associated client as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClientRecord {
    pub mac: MacAddr,
    pub rssi: i32,
    /// Last tx/rx unicast rates in 100 kbps units.
    pub rate_tx: u32,
    pub rate_rx: u32,
    pub bytes_tx: u64,
    pub bytes_rx: u64,
    pub packets_tx: u64,
    pub packets_rx: u64,
}

/// Per-channel occupancy sample from a driver survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SurveyRecord {
    pub channel: u32,
    /// True for the channel the radio is currently serving.
    pub in_use: bool,
    pub noise: i32,
    /// Active/busy/rx/tx split of the observation window, milliseconds.
    pub duration_ms: u64,
    pub chan_busy: u64,
    pub chan_busy_ext: u64,
    pub chan_rx: u64,
    pub chan_tx: u64,
    pub chan_self: u64,
}

/// One neighboring BSS observed by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NeighborRecord {
    pub bssid: MacAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    pub channel: u32,
    pub rssi: i32,
    pub tsf: u64,
    pub beacon_interval_tu: u16,
    pub last_seen_ms: u32,
}

/// Radio temperature sample, degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempRecord {
    pub radio_type: RadioType,
    pub value_c: i32,
}

/// Configured transmit chain mask of a radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainmaskRecord {
    pub radio_type: RadioType,
    pub value: u32,
}

/// A batch of stats records tagged with the radio that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport<T> {
    pub radio: String,
    pub radio_type: RadioType,
    pub when: DateTime<Utc>,
    pub records: Vec<T>,
}

impl<T> StatsReport<T> {
    pub fn new(radio: &str, radio_type: RadioType, records: Vec<T>) -> Self {
        Self {
            radio: radio.to_string(),
            radio_type,
            when: Utc::now(),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_type_spelling() {
        assert_eq!(RadioType::Band2G.as_str(), "2.4G");
        assert_eq!(RadioType::from_band_str("5GL"), Some(RadioType::Band5GL));
        assert_eq!(RadioType::from_band_str("6G"), None);
        assert!(RadioType::Band5GU.is_5g());
        assert!(!RadioType::Band2G.is_5g());
    }

    #[test]
    fn test_report_tagging() {
        let report = StatsReport::new("wifi0", RadioType::Band5G, vec![SurveyRecord::default()]);
        assert_eq!(report.radio, "wifi0");
        assert_eq!(report.records.len(), 1);
    }
}
