//! nl80211 query engine boundary.
//!
//! [`WirelessBackend`] is the seam between the agent and the kernel: the
//! real implementation is [`client::Nl80211Client`]; tests drive the agent
//! through [`mock::MockBackend`]. All requests are blocking round-trips
//! with a receive timeout so a wedged driver surfaces as an error instead
//! of hanging the scheduler.

pub mod attr;
pub mod client;
pub mod ie;
pub mod mock;

use crate::error::{AgentError, Result};
use crate::registry::{PhyInfo, StationInfo, VifInfo};
use airsync_common::{NeighborRecord, ScanType, SurveyRecord};

pub use client::Nl80211Client;
pub use mock::MockBackend;

/// Result of draining a scan dump. A decode failure partway through keeps
/// whatever was already decoded and records the failure, so callers see a
/// partial list plus an error marker rather than a silent truncation.
#[derive(Debug, Default)]
pub struct ScanDump {
    pub neighbors: Vec<NeighborRecord>,
    pub truncated: Option<AgentError>,
}

/// Low-level wireless queries, addressed by device name.
pub trait WirelessBackend: Send {
    /// Enumerates all phys and their virtual interfaces.
    fn enumerate(&mut self) -> Result<(Vec<PhyInfo>, Vec<VifInfo>)>;

    /// Configured tx antenna mask of a phy.
    fn tx_chainmask(&mut self, phy: &str) -> Result<u32>;

    /// Stations associated to an interface. Empty is success.
    fn assoclist(&mut self, ifname: &str) -> Result<Vec<StationInfo>>;

    /// Per-channel occupancy survey for an interface's phy.
    fn survey(&mut self, ifname: &str) -> Result<Vec<SurveyRecord>>;

    /// Kicks off a scan; completion is observed via [`scan_dump`] or
    /// [`scan_abort`].
    ///
    /// [`scan_dump`]: WirelessBackend::scan_dump
    /// [`scan_abort`]: WirelessBackend::scan_abort
    fn scan_trigger(
        &mut self,
        ifname: &str,
        channels: &[u32],
        dwell_ms: u32,
        scan_type: ScanType,
    ) -> Result<()>;

    fn scan_abort(&mut self, ifname: &str) -> Result<()>;

    /// Drains cached scan results, tolerating multi-message responses.
    fn scan_dump(&mut self, ifname: &str) -> Result<ScanDump>;
}

// Lets a caller keep a handle on the backend it hands the agent.
impl<B: WirelessBackend> WirelessBackend for std::sync::Arc<std::sync::Mutex<B>> {
    fn enumerate(&mut self) -> Result<(Vec<PhyInfo>, Vec<VifInfo>)> {
        locked(self)?.enumerate()
    }

    fn tx_chainmask(&mut self, phy: &str) -> Result<u32> {
        locked(self)?.tx_chainmask(phy)
    }

    fn assoclist(&mut self, ifname: &str) -> Result<Vec<StationInfo>> {
        locked(self)?.assoclist(ifname)
    }

    fn survey(&mut self, ifname: &str) -> Result<Vec<SurveyRecord>> {
        locked(self)?.survey(ifname)
    }

    fn scan_trigger(
        &mut self,
        ifname: &str,
        channels: &[u32],
        dwell_ms: u32,
        scan_type: ScanType,
    ) -> Result<()> {
        locked(self)?.scan_trigger(ifname, channels, dwell_ms, scan_type)
    }

    fn scan_abort(&mut self, ifname: &str) -> Result<()> {
        locked(self)?.scan_abort(ifname)
    }

    fn scan_dump(&mut self, ifname: &str) -> Result<ScanDump> {
        locked(self)?.scan_dump(ifname)
    }
}

fn locked<B>(
    backend: &std::sync::Arc<std::sync::Mutex<B>>,
) -> Result<std::sync::MutexGuard<'_, B>> {
    backend
        .lock()
        .map_err(|_| AgentError::Hardware("backend lock poisoned".to_string()))
}

/// IEEE 802.11 channel number for a center frequency in MHz.
pub fn freq_to_channel(freq: u32) -> Option<u32> {
    match freq {
        2412..=2472 => Some((freq - 2407) / 5),
        2484 => Some(14),
        5000..=5980 => Some((freq - 5000) / 5),
        _ => None,
    }
}

/// Center frequency in MHz for an IEEE 802.11 channel number.
pub fn channel_to_freq(channel: u32) -> Option<u32> {
    match channel {
        14 => Some(2484),
        1..=13 => Some(2407 + channel * 5),
        32..=196 => Some(5000 + channel * 5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freq_channel_mapping() {
        assert_eq!(freq_to_channel(2412), Some(1));
        assert_eq!(freq_to_channel(2484), Some(14));
        assert_eq!(freq_to_channel(5180), Some(36));
        assert_eq!(freq_to_channel(5825), Some(165));
        assert_eq!(freq_to_channel(900), None);

        assert_eq!(channel_to_freq(1), Some(2412));
        assert_eq!(channel_to_freq(14), Some(2484));
        assert_eq!(channel_to_freq(36), Some(5180));
        assert_eq!(channel_to_freq(0), None);
    }

    #[test]
    fn test_mapping_is_inverse() {
        for chan in [1u32, 6, 11, 14, 36, 52, 100, 149, 165] {
            let freq = channel_to_freq(chan).unwrap();
            assert_eq!(freq_to_channel(freq), Some(chan));
        }
    }
}
