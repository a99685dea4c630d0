//! Indexed device registry: phys, VIFs and stations.
//!
//! Entries live in arenas and refer to each other by index, with ordered
//! name/address maps on top for O(log n) lookup. Parent/child relations
//! are index lookups, so removal can never leave a dangling reference:
//! removing a phy cascades through its VIFs and their stations.

use crate::error::{AgentError, Result};
use crate::nl80211::WirelessBackend;
use airsync_common::MacAddr;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Highest channel number tracked per phy, exclusive.
pub const MAX_CHANNELS: usize = 197;

pub type PhyId = usize;
pub type VifId = usize;
pub type StaId = usize;

/// Per-channel facts reported by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelEntry {
    /// Non-zero channel number marks the slot as defined.
    pub channel: u8,
    pub freq: u32,
    pub disabled: bool,
    pub dfs: bool,
    /// Regulatory maximum, dBm.
    pub max_power: u8,
}

/// Enumerated facts for one phy, as decoded from a wiphy dump.
#[derive(Debug, Clone, Default)]
pub struct PhyInfo {
    pub name: String,
    pub mac: Option<MacAddr>,
    pub ht_capa: u16,
    pub vht_capa: u32,
    pub channels: Vec<ChannelEntry>,
    pub tx_ant: u32,
    pub rx_ant: u32,
    pub tx_ant_avail: u32,
    pub rx_ant_avail: u32,
}

/// Enumerated facts for one VIF, as decoded from an interface dump.
#[derive(Debug, Clone)]
pub struct VifInfo {
    pub name: String,
    pub addr: MacAddr,
    pub phy_name: String,
}

/// One association entry from a station dump.
#[derive(Debug, Clone, Default)]
pub struct StationInfo {
    pub addr: MacAddr,
    pub signal: i32,
    pub rate_tx: u32,
    pub rate_rx: u32,
    pub bytes_tx: u64,
    pub bytes_rx: u64,
    pub packets_tx: u64,
    pub packets_rx: u64,
}

#[derive(Debug)]
pub struct Phy {
    pub name: String,
    pub mac: Option<MacAddr>,
    pub ht_capa: u16,
    pub vht_capa: u32,
    /// Indexed by channel number, sized MAX_CHANNELS.
    pub channels: Vec<ChannelEntry>,
    pub tx_ant: u32,
    pub rx_ant: u32,
    pub tx_ant_avail: u32,
    pub rx_ant_avail: u32,
    pub band_2g: bool,
    pub band_5gl: bool,
    pub band_5gu: bool,
    vifs: Vec<VifId>,
}

impl Phy {
    /// Channel numbers usable in the current regulatory domain.
    pub fn allowed_channels(&self) -> Vec<u32> {
        self.channels
            .iter()
            .filter(|c| c.channel != 0 && !c.disabled)
            .map(|c| c.channel as u32)
            .collect()
    }

    pub fn has_dfs(&self) -> bool {
        self.channels.iter().any(|c| c.channel != 0 && c.dfs)
    }

    /// Schema band string, or None when the phy serves both halves of 5G.
    pub fn band(&self) -> Option<&'static str> {
        match (self.band_2g, self.band_5gl, self.band_5gu) {
            (true, false, false) => Some("2.4G"),
            (false, true, false) => Some("5GL"),
            (false, false, true) => Some("5GU"),
            (false, true, true) => Some("5G"),
            _ => None,
        }
    }

    pub fn vif_ids(&self) -> &[VifId] {
        &self.vifs
    }
}

#[derive(Debug)]
pub struct Vif {
    pub name: String,
    pub addr: MacAddr,
    pub phy: PhyId,
    pub noise: i32,
    stations: Vec<StaId>,
}

impl Vif {
    pub fn station_ids(&self) -> &[StaId] {
        &self.stations
    }
}

#[derive(Debug)]
pub struct Station {
    pub addr: MacAddr,
    pub vif: VifId,
    pub signal: i32,
}

/// The indexed collection of all known wireless entities.
#[derive(Debug, Default)]
pub struct Registry {
    phys: Vec<Option<Phy>>,
    vifs: Vec<Option<Vif>>,
    stations: Vec<Option<Station>>,
    phy_by_name: BTreeMap<String, PhyId>,
    vif_by_name: BTreeMap<String, VifId>,
    sta_by_addr: BTreeMap<MacAddr, StaId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-time enumeration of hardware through the netlink layer. The
    /// netlink backend must already be connected.
    pub fn init(&mut self, backend: &mut dyn WirelessBackend) -> Result<()> {
        let (phys, vifs) = backend.enumerate()?;
        for info in phys {
            self.upsert_phy(info)?;
        }
        for info in vifs {
            self.upsert_vif(info)?;
        }
        info!(
            "Registry initialized: {} phys, {} vifs",
            self.phy_by_name.len(),
            self.vif_by_name.len()
        );
        Ok(())
    }

    pub fn find_phy(&self, name: &str) -> Option<&Phy> {
        self.phy_by_name
            .get(name)
            .and_then(|id| self.phys[*id].as_ref())
    }

    pub fn find_vif(&self, name: &str) -> Option<&Vif> {
        self.vif_by_name
            .get(name)
            .and_then(|id| self.vifs[*id].as_ref())
    }

    pub fn find_station(&self, addr: &MacAddr) -> Option<&Station> {
        self.sta_by_addr
            .get(addr)
            .and_then(|id| self.stations[*id].as_ref())
    }

    /// Inserts or refreshes a phy. An existing entry keeps its VIF children.
    pub fn upsert_phy(&mut self, info: PhyInfo) -> Result<PhyId> {
        let mut channels = vec![ChannelEntry::default(); MAX_CHANNELS];
        let mut band_2g = false;
        let mut band_5gl = false;
        let mut band_5gu = false;
        for entry in &info.channels {
            let chan = entry.channel as usize;
            if chan == 0 || chan >= MAX_CHANNELS {
                return Err(AgentError::Decode(format!(
                    "{}: channel {} out of range",
                    info.name, chan
                )));
            }
            channels[chan] = *entry;
            match chan {
                1..=14 => band_2g = true,
                36..=64 => band_5gl = true,
                100..=196 => band_5gu = true,
                _ => {}
            }
        }

        if let Some(&id) = self.phy_by_name.get(&info.name) {
            let phy = self.phys[id].as_mut().ok_or_else(|| {
                AgentError::NotFound(format!("phy slot for {}", info.name))
            })?;
            phy.mac = info.mac;
            phy.ht_capa = info.ht_capa;
            phy.vht_capa = info.vht_capa;
            phy.channels = channels;
            phy.tx_ant = info.tx_ant;
            phy.rx_ant = info.rx_ant;
            phy.tx_ant_avail = info.tx_ant_avail;
            phy.rx_ant_avail = info.rx_ant_avail;
            phy.band_2g = band_2g;
            phy.band_5gl = band_5gl;
            phy.band_5gu = band_5gu;
            return Ok(id);
        }

        let phy = Phy {
            name: info.name.clone(),
            mac: info.mac,
            ht_capa: info.ht_capa,
            vht_capa: info.vht_capa,
            channels,
            tx_ant: info.tx_ant,
            rx_ant: info.rx_ant,
            tx_ant_avail: info.tx_ant_avail,
            rx_ant_avail: info.rx_ant_avail,
            band_2g,
            band_5gl,
            band_5gu,
            vifs: Vec::new(),
        };
        let id = self.alloc_phy(phy);
        self.phy_by_name.insert(info.name, id);
        Ok(id)
    }

    /// Inserts or refreshes a VIF under its parent phy.
    pub fn upsert_vif(&mut self, info: VifInfo) -> Result<VifId> {
        let phy_id = *self
            .phy_by_name
            .get(&info.phy_name)
            .ok_or_else(|| AgentError::NotFound(format!("phy {}", info.phy_name)))?;

        if let Some(&id) = self.vif_by_name.get(&info.name) {
            let vif = self.vifs[id]
                .as_mut()
                .ok_or_else(|| AgentError::NotFound(format!("vif slot for {}", info.name)))?;
            vif.addr = info.addr;
            if vif.phy != phy_id {
                // moved between phys: relink the child lists
                let old_phy = vif.phy;
                vif.phy = phy_id;
                if let Some(phy) = self.phys[old_phy].as_mut() {
                    phy.vifs.retain(|v| *v != id);
                }
                if let Some(phy) = self.phys[phy_id].as_mut() {
                    phy.vifs.push(id);
                }
            }
            return Ok(id);
        }

        let vif = Vif {
            name: info.name.clone(),
            addr: info.addr,
            phy: phy_id,
            noise: 0,
            stations: Vec::new(),
        };
        let id = self.alloc_vif(vif);
        self.vif_by_name.insert(info.name, id);
        if let Some(phy) = self.phys[phy_id].as_mut() {
            phy.vifs.push(id);
        }
        Ok(id)
    }

    pub fn set_vif_noise(&mut self, name: &str, noise: i32) {
        if let Some(&id) = self.vif_by_name.get(name) {
            if let Some(vif) = self.vifs[id].as_mut() {
                vif.noise = noise;
            }
        }
    }

    /// Reconciles a VIF's station set with an observed association list:
    /// creates newcomers, refreshes survivors, drops the disappeared.
    pub fn sync_stations(&mut self, vif_name: &str, observed: &[StationInfo]) -> Result<()> {
        let vif_id = *self
            .vif_by_name
            .get(vif_name)
            .ok_or_else(|| AgentError::NotFound(format!("vif {}", vif_name)))?;

        let current: Vec<StaId> = self.vifs[vif_id]
            .as_ref()
            .map(|v| v.stations.clone())
            .unwrap_or_default();
        for sta_id in current {
            let gone = self.stations[sta_id]
                .as_ref()
                .map(|s| !observed.iter().any(|o| o.addr == s.addr))
                .unwrap_or(false);
            if gone {
                self.remove_station(sta_id);
            }
        }

        for obs in observed {
            match self.sta_by_addr.get(&obs.addr).copied() {
                Some(id) => {
                    if let Some(sta) = self.stations[id].as_mut() {
                        sta.signal = obs.signal;
                    }
                }
                None => {
                    let sta = Station {
                        addr: obs.addr,
                        vif: vif_id,
                        signal: obs.signal,
                    };
                    let id = self.alloc_station(sta);
                    self.sta_by_addr.insert(obs.addr, id);
                    if let Some(vif) = self.vifs[vif_id].as_mut() {
                        vif.stations.push(id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Removes a phy and everything under it.
    pub fn remove_phy(&mut self, name: &str) {
        let Some(id) = self.phy_by_name.remove(name) else {
            return;
        };
        let children = self.phys[id]
            .as_ref()
            .map(|p| p.vifs.clone())
            .unwrap_or_default();
        for vif_id in children {
            self.remove_vif_by_id(vif_id);
        }
        self.phys[id] = None;
        debug!("Removed phy {}", name);
    }

    pub fn remove_vif(&mut self, name: &str) {
        if let Some(id) = self.vif_by_name.get(name).copied() {
            self.remove_vif_by_id(id);
        }
    }

    fn remove_vif_by_id(&mut self, id: VifId) {
        let Some(vif) = self.vifs[id].take() else {
            return;
        };
        for sta_id in &vif.stations {
            if let Some(sta) = self.stations[*sta_id].take() {
                self.sta_by_addr.remove(&sta.addr);
            }
        }
        if let Some(phy) = self.phys[vif.phy].as_mut() {
            phy.vifs.retain(|v| *v != id);
        }
        self.vif_by_name.remove(&vif.name);
    }

    fn remove_station(&mut self, id: StaId) {
        let Some(sta) = self.stations[id].take() else {
            return;
        };
        self.sta_by_addr.remove(&sta.addr);
        if let Some(vif) = self.vifs[sta.vif].as_mut() {
            vif.stations.retain(|s| *s != id);
        }
    }

    pub fn station_addr(&self, id: StaId) -> Option<MacAddr> {
        self.stations.get(id).and_then(Option::as_ref).map(|s| s.addr)
    }

    pub fn phy_names(&self) -> Vec<String> {
        self.phy_by_name.keys().cloned().collect()
    }

    fn alloc_phy(&mut self, phy: Phy) -> PhyId {
        match self.phys.iter().position(Option::is_none) {
            Some(id) => {
                self.phys[id] = Some(phy);
                id
            }
            None => {
                self.phys.push(Some(phy));
                self.phys.len() - 1
            }
        }
    }

    fn alloc_vif(&mut self, vif: Vif) -> VifId {
        match self.vifs.iter().position(Option::is_none) {
            Some(id) => {
                self.vifs[id] = Some(vif);
                id
            }
            None => {
                self.vifs.push(Some(vif));
                self.vifs.len() - 1
            }
        }
    }

    fn alloc_station(&mut self, sta: Station) -> StaId {
        match self.stations.iter().position(Option::is_none) {
            Some(id) => {
                self.stations[id] = Some(sta);
                id
            }
            None => {
                self.stations.push(Some(sta));
                self.stations.len() - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phy_info(name: &str, chans: &[(u8, bool)]) -> PhyInfo {
        PhyInfo {
            name: name.to_string(),
            channels: chans
                .iter()
                .map(|(chan, dfs)| ChannelEntry {
                    channel: *chan,
                    freq: 5000 + *chan as u32 * 5,
                    dfs: *dfs,
                    ..Default::default()
                })
                .collect(),
            tx_ant: 3,
            ..Default::default()
        }
    }

    fn vif_info(name: &str, phy: &str, last: u8) -> VifInfo {
        VifInfo {
            name: name.to_string(),
            addr: MacAddr([0, 1, 2, 3, 4, last]),
            phy_name: phy.to_string(),
        }
    }

    #[test]
    fn test_lookup_after_insert() {
        let mut reg = Registry::new();
        reg.upsert_phy(phy_info("phy0", &[(36, false), (52, true)])).unwrap();
        reg.upsert_vif(vif_info("wlan0", "phy0", 1)).unwrap();

        let phy = reg.find_phy("phy0").unwrap();
        assert_eq!(phy.channels.len(), MAX_CHANNELS);
        assert!(phy.band_5gl);
        assert!(phy.has_dfs());
        assert_eq!(phy.allowed_channels(), vec![36, 52]);
        assert_eq!(phy.band(), Some("5GL"));

        let vif = reg.find_vif("wlan0").unwrap();
        assert_eq!(vif.addr, MacAddr([0, 1, 2, 3, 4, 1]));
        assert!(reg.find_vif("wlan9").is_none());
    }

    #[test]
    fn test_out_of_range_channel_rejected() {
        let mut reg = Registry::new();
        let err = reg.upsert_phy(phy_info("phy0", &[(250, false)])).unwrap_err();
        assert!(matches!(err, AgentError::Decode(_)));
    }

    #[test]
    fn test_vif_requires_parent() {
        let mut reg = Registry::new();
        let err = reg.upsert_vif(vif_info("wlan0", "phy7", 1)).unwrap_err();
        assert!(matches!(err, AgentError::NotFound(_)));
    }

    #[test]
    fn test_station_sync_tracks_association() {
        let mut reg = Registry::new();
        reg.upsert_phy(phy_info("phy0", &[(1, false)])).unwrap();
        reg.upsert_vif(vif_info("wlan0", "phy0", 1)).unwrap();

        let a = StationInfo { addr: MacAddr([9, 0, 0, 0, 0, 1]), signal: -40, ..Default::default() };
        let b = StationInfo { addr: MacAddr([9, 0, 0, 0, 0, 2]), signal: -55, ..Default::default() };
        reg.sync_stations("wlan0", &[a.clone(), b.clone()]).unwrap();
        assert_eq!(reg.find_vif("wlan0").unwrap().station_ids().len(), 2);
        assert_eq!(reg.find_station(&a.addr).unwrap().signal, -40);

        // b disassociates, a's signal changes
        let a2 = StationInfo { signal: -42, ..a.clone() };
        reg.sync_stations("wlan0", &[a2]).unwrap();
        assert_eq!(reg.find_vif("wlan0").unwrap().station_ids().len(), 1);
        assert!(reg.find_station(&b.addr).is_none());
        assert_eq!(reg.find_station(&a.addr).unwrap().signal, -42);
    }

    #[test]
    fn test_remove_phy_cascades() {
        let mut reg = Registry::new();
        reg.upsert_phy(phy_info("phy0", &[(1, false)])).unwrap();
        reg.upsert_vif(vif_info("wlan0", "phy0", 1)).unwrap();
        let sta = StationInfo { addr: MacAddr([9, 0, 0, 0, 0, 3]), ..Default::default() };
        reg.sync_stations("wlan0", &[sta.clone()]).unwrap();

        reg.remove_phy("phy0");
        assert!(reg.find_phy("phy0").is_none());
        assert!(reg.find_vif("wlan0").is_none());
        assert!(reg.find_station(&sta.addr).is_none());
    }

    #[test]
    fn test_upsert_keeps_children() {
        let mut reg = Registry::new();
        reg.upsert_phy(phy_info("phy0", &[(36, false)])).unwrap();
        reg.upsert_vif(vif_info("wlan0", "phy0", 1)).unwrap();
        reg.upsert_phy(phy_info("phy0", &[(36, false), (40, false)])).unwrap();
        assert_eq!(reg.find_phy("phy0").unwrap().vif_ids().len(), 1);
        assert_eq!(reg.find_phy("phy0").unwrap().allowed_channels(), vec![36, 40]);
    }
}
