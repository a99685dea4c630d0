//! Deterministic wireless backend for tests.
//!
//! Serves canned enumeration and query results, records scan control
//! calls, and can be told to fail any operation.

use super::{ScanDump, WirelessBackend};
use crate::error::{AgentError, Result};
use crate::registry::{ChannelEntry, PhyInfo, StationInfo, VifInfo};
use airsync_common::{MacAddr, NeighborRecord, ScanType, SurveyRecord};
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MockBackend {
    pub phys: Vec<PhyInfo>,
    pub vifs: Vec<VifInfo>,
    pub stations: BTreeMap<String, Vec<StationInfo>>,
    pub surveys: BTreeMap<String, Vec<SurveyRecord>>,
    pub neighbors: BTreeMap<String, Vec<NeighborRecord>>,
    pub chainmasks: BTreeMap<String, u32>,
    /// (ifname, channels, dwell_ms, scan_type) per trigger call.
    pub triggers: Vec<(String, Vec<u32>, u32, ScanType)>,
    pub aborts: Vec<String>,
    pub fail_trigger: bool,
    pub fail_assoclist: bool,
    pub truncate_scan_dump: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-phy backend: phy1 with channels 36/40/52(DFS), one VIF.
    pub fn one_radio() -> Self {
        let mut mock = Self::new();
        mock.phys.push(PhyInfo {
            name: "phy1".to_string(),
            mac: Some(MacAddr([2, 0, 0, 0, 0, 1])),
            ht_capa: 0x19ef,
            vht_capa: 0x338001b2,
            channels: vec![
                ChannelEntry { channel: 36, freq: 5180, disabled: false, dfs: false, max_power: 23 },
                ChannelEntry { channel: 40, freq: 5200, disabled: false, dfs: false, max_power: 23 },
                ChannelEntry { channel: 52, freq: 5260, disabled: false, dfs: true, max_power: 23 },
            ],
            tx_ant: 3,
            rx_ant: 3,
            tx_ant_avail: 3,
            rx_ant_avail: 3,
        });
        mock.vifs.push(VifInfo {
            name: "home_ap_50".to_string(),
            addr: MacAddr([2, 0, 0, 0, 0, 0x50]),
            phy_name: "phy1".to_string(),
        });
        mock.chainmasks.insert("phy1".to_string(), 3);
        mock
    }
}

impl WirelessBackend for MockBackend {
    fn enumerate(&mut self) -> Result<(Vec<PhyInfo>, Vec<VifInfo>)> {
        Ok((self.phys.clone(), self.vifs.clone()))
    }

    fn tx_chainmask(&mut self, phy: &str) -> Result<u32> {
        self.chainmasks
            .get(phy)
            .copied()
            .ok_or_else(|| AgentError::NotFound(format!("phy {}", phy)))
    }

    fn assoclist(&mut self, ifname: &str) -> Result<Vec<StationInfo>> {
        if self.fail_assoclist {
            return Err(AgentError::Decode("assoclist refused".to_string()));
        }
        Ok(self.stations.get(ifname).cloned().unwrap_or_default())
    }

    fn survey(&mut self, ifname: &str) -> Result<Vec<SurveyRecord>> {
        Ok(self.surveys.get(ifname).cloned().unwrap_or_default())
    }

    fn scan_trigger(
        &mut self,
        ifname: &str,
        channels: &[u32],
        dwell_ms: u32,
        scan_type: ScanType,
    ) -> Result<()> {
        if self.fail_trigger {
            return Err(AgentError::Hardware("trigger refused".to_string()));
        }
        self.triggers
            .push((ifname.to_string(), channels.to_vec(), dwell_ms, scan_type));
        Ok(())
    }

    fn scan_abort(&mut self, ifname: &str) -> Result<()> {
        self.aborts.push(ifname.to_string());
        Ok(())
    }

    fn scan_dump(&mut self, ifname: &str) -> Result<ScanDump> {
        let mut neighbors = self.neighbors.get(ifname).cloned().unwrap_or_default();
        let truncated = if self.truncate_scan_dump {
            neighbors.truncate(neighbors.len().saturating_sub(1));
            Some(AgentError::Decode("dump terminated early".to_string()))
        } else {
            None
        };
        Ok(ScanDump {
            neighbors,
            truncated,
        })
    }
}
