//! Stats/query facade.
//!
//! Per-radio on-demand operations: association list, channel survey, scan
//! control, temperature and chain mask. Callers speak logical names and
//! get normalized records; the completion callback of every request fires
//! exactly once, empty results included.

use crate::agent::{Agent, ScanCb};
use crate::error::{AgentError, Result};
use crate::registry::StationInfo;
use airsync_common::{
    ChainmaskRecord, ClientRecord, NeighborRecord, RadioType, ScanType, StatsReport, SurveyRecord,
    TempRecord,
};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Scan results drained after a completed sweep. `truncated` carries the
/// decode failure when the kernel ended the dump early; the records before
/// the failure are still present.
pub struct ScanResults {
    pub report: StatsReport<NeighborRecord>,
    pub truncated: Option<AgentError>,
}

/// Copies the current-generation client sample into a publishable record.
/// Counters are cumulative; the delta against `_old` is computed upstream.
pub fn convert_client(new: &ClientRecord, _old: Option<&ClientRecord>) -> ClientRecord {
    new.clone()
}

/// Same contract as [`convert_client`], for survey samples.
pub fn convert_survey(new: &SurveyRecord, _old: Option<&SurveyRecord>) -> SurveyRecord {
    new.clone()
}

fn client_from_station(sta: &StationInfo) -> ClientRecord {
    ClientRecord {
        mac: sta.addr,
        rssi: sta.signal,
        rate_tx: sta.rate_tx,
        rate_rx: sta.rate_rx,
        bytes_tx: sta.bytes_tx,
        bytes_rx: sta.bytes_rx,
        packets_tx: sta.packets_tx,
        packets_rx: sta.packets_rx,
    }
}

impl Agent {
    /// Association list for a VIF. An interface with no stations yields an
    /// empty report and success. The callback fires exactly once either way.
    pub fn stats_clients_get<F>(&mut self, name: &str, radio_type: RadioType, cb: F) -> Result<()>
    where
        F: FnOnce(StatsReport<ClientRecord>, bool),
    {
        let ifname = self.ifmap.to_device(name).to_string();
        match self.backend.assoclist(&ifname) {
            Ok(stations) => {
                // keep the registry's station set tied to observed association
                if let Err(e) = self.registry.sync_stations(&ifname, &stations) {
                    debug!("{}: station sync skipped: {}", ifname, e);
                }
                let records = stations.iter().map(client_from_station).collect();
                cb(StatsReport::new(name, radio_type, records), true);
                Ok(())
            }
            Err(e) => {
                warn!("{}: assoclist failed: {}", name, e);
                cb(StatsReport::new(name, radio_type, Vec::new()), false);
                Err(e)
            }
        }
    }

    /// Channel survey for a VIF's phy. The serving channel's noise figure
    /// refreshes the registry entry.
    pub fn stats_survey_get<F>(&mut self, name: &str, radio_type: RadioType, cb: F) -> Result<()>
    where
        F: FnOnce(StatsReport<SurveyRecord>, bool),
    {
        let ifname = self.ifmap.to_device(name).to_string();
        match self.backend.survey(&ifname) {
            Ok(records) => {
                if let Some(current) = records.iter().find(|r| r.in_use) {
                    self.registry.set_vif_noise(&ifname, current.noise);
                }
                cb(StatsReport::new(name, radio_type, records), true);
                Ok(())
            }
            Err(e) => {
                warn!("{}: survey failed: {}", name, e);
                cb(StatsReport::new(name, radio_type, Vec::new()), false);
                Err(e)
            }
        }
    }

    /// Triggers a scan. The completion callback fires exactly once: from a
    /// later [`scan_results`]/[`scan_stop`], from a superseding trigger, or
    /// synchronously with failure when the trigger itself is refused.
    ///
    /// [`scan_results`]: Agent::scan_results
    /// [`scan_stop`]: Agent::scan_stop
    pub fn scan_start(
        &mut self,
        name: &str,
        channels: &[u32],
        dwell_ms: u32,
        scan_type: ScanType,
        cb: ScanCb,
    ) -> Result<()> {
        let ifname = self.ifmap.to_device(name).to_string();
        if let Some(old) = self.pending_scans.remove(&ifname) {
            warn!("{}: superseding still-pending scan", name);
            old(false);
        }
        match self
            .backend
            .scan_trigger(&ifname, channels, dwell_ms, scan_type)
        {
            Ok(()) => {
                self.pending_scans.insert(ifname, cb);
                Ok(())
            }
            Err(e) => {
                warn!("{}: failed to trigger scan, aborting", name);
                cb(false);
                Err(e)
            }
        }
    }

    /// Aborts an in-flight scan; its pending callback fires with failure.
    pub fn scan_stop(&mut self, name: &str) -> Result<()> {
        let ifname = self.ifmap.to_device(name).to_string();
        let outcome = self.backend.scan_abort(&ifname);
        if let Some(cb) = self.pending_scans.remove(&ifname) {
            cb(false);
        }
        outcome
    }

    /// Drains scan results and completes the pending scan, if any.
    pub fn scan_results(&mut self, name: &str, radio_type: RadioType) -> Result<ScanResults> {
        let ifname = self.ifmap.to_device(name).to_string();
        match self.backend.scan_dump(&ifname) {
            Ok(dump) => {
                if let Some(cb) = self.pending_scans.remove(&ifname) {
                    cb(true);
                }
                if let Some(ref e) = dump.truncated {
                    warn!("{}: scan dump truncated: {}", name, e);
                }
                Ok(ScanResults {
                    report: StatsReport::new(name, radio_type, dump.neighbors),
                    truncated: dump.truncated,
                })
            }
            Err(e) => {
                if let Some(cb) = self.pending_scans.remove(&ifname) {
                    cb(false);
                }
                Err(e)
            }
        }
    }

    /// Radio temperature from the phy's hwmon node, degrees Celsius.
    pub fn stats_temp_get(&mut self, name: &str, radio_type: RadioType) -> Result<TempRecord> {
        let phy = self.ifmap.to_device(name);
        let hwmon_root = PathBuf::from(&self.cfg.sysfs_root)
            .join(phy)
            .join("device")
            .join("hwmon");
        let entries = fs::read_dir(&hwmon_root)
            .map_err(|e| AgentError::Hardware(format!("{}: hwmon is missing: {}", phy, e)))?;
        for entry in entries.flatten() {
            let input = entry.path().join("temp1_input");
            if !input.exists() {
                continue;
            }
            let raw = fs::read_to_string(&input)
                .map_err(|e| AgentError::Hardware(format!("{}: {}", input.display(), e)))?;
            let millideg: i32 = raw.trim().parse().map_err(|_| {
                AgentError::Hardware(format!("{}: unreadable temperature", input.display()))
            })?;
            return Ok(TempRecord {
                radio_type,
                value_c: millideg / 1000,
            });
        }
        Err(AgentError::Hardware(format!("{}: no temp1_input", phy)))
    }

    /// Configured tx chain mask of a radio.
    pub fn stats_chainmask_get(
        &mut self,
        name: &str,
        radio_type: RadioType,
    ) -> Result<ChainmaskRecord> {
        let phy = self.ifmap.to_device(name).to_string();
        let value = self.backend.tx_chainmask(&phy)?;
        Ok(ChainmaskRecord { radio_type, value })
    }
}
