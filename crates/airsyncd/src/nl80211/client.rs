//! Generic-netlink client for the nl80211 family.
//!
//! One blocking socket, request/response per call. Dumps are drained to
//! the Done message even when an entry fails to decode, so one bad entry
//! never desynchronizes the socket.

use super::attr::{
    Nl80211Attr, Nl80211BandAttr, Nl80211Bss, Nl80211Command, Nl80211FrequencyAttr,
    Nl80211RateInfo, Nl80211StaInfo, Nl80211SurveyInfo, NL80211_GENL_NAME,
};
use super::{freq_to_channel, ie, ScanDump, WirelessBackend};
use crate::error::{AgentError, Result};
use crate::registry::{ChannelEntry, PhyInfo, StationInfo, VifInfo};
use airsync_common::{MacAddr, NeighborRecord, ScanType, SurveyRecord};
use neli::consts::nl::{NlmF, NlmFFlags, Nlmsg};
use neli::consts::socket::NlFamily;
use neli::err::{NlError, SerError, WrappedError};
use neli::genl::{Genlmsghdr, Nlattr};
use neli::nl::{NlPayload, Nlmsghdr};
use neli::socket::NlSocketHandle;
use neli::types::{Buffer, GenlBuffer};
use nix::sys::socket::{setsockopt, sockopt::ReceiveTimeout};
use nix::sys::time::TimeVal;
use std::collections::BTreeMap;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::time::Duration;
use tracing::{debug, warn};

const NL80211_GENL_VERSION: u8 = 1;

type Nl80211Payload = Genlmsghdr<Nl80211Command, Nl80211Attr>;

pub struct Nl80211Client {
    sock: NlSocketHandle,
    family_id: u16,
}

fn map_nl_err<T, P>(ctx: &str, err: NlError<T, P>) -> AgentError
where
    T: std::fmt::Debug,
    P: std::fmt::Debug,
{
    match err {
        NlError::Wrapped(WrappedError::IOError(ref io))
            if io.kind() == std::io::ErrorKind::WouldBlock
                || io.kind() == std::io::ErrorKind::TimedOut =>
        {
            AgentError::Timeout(format!("{}: {}", ctx, io))
        }
        other => AgentError::Decode(format!("{}: {}", ctx, other)),
    }
}

fn map_ser_err(ctx: &str, err: SerError) -> AgentError {
    match err {
        SerError::Wrapped(WrappedError::IOError(ref io)) => {
            AgentError::Hardware(format!("{}: {}", ctx, io))
        }
        other => AgentError::Decode(format!("{}: {}", ctx, other)),
    }
}

/// Maps a kernel nack to the agent's error kinds. ENOENT and ENODEV mean
/// the target is gone, everything else is a driver refusal.
fn map_errno(cmd: Nl80211Command, errno: i32) -> AgentError {
    if errno == 2 || errno == 19 {
        AgentError::NotFound(format!("{:?}: errno {}", cmd, errno))
    } else {
        AgentError::Hardware(format!("{:?}: errno {}", cmd, errno))
    }
}

impl Nl80211Client {
    /// Opens the generic-netlink socket, resolves the nl80211 family and
    /// arms the receive timeout. Must run before `Registry::init`.
    pub fn connect(recv_timeout: Duration) -> Result<Self> {
        let mut sock = NlSocketHandle::connect(NlFamily::Generic, None, &[])
            .map_err(|e| AgentError::Hardware(format!("netlink socket: {}", e)))?;
        let family_id = sock
            .resolve_genl_family(NL80211_GENL_NAME)
            .map_err(|e| AgentError::Hardware(format!("resolve nl80211: {}", e)))?;

        let tv = TimeVal::new(
            recv_timeout.as_secs() as _,
            recv_timeout.subsec_micros() as _,
        );
        // NlSocketHandle only exposes a raw fd
        let fd = unsafe { BorrowedFd::borrow_raw(sock.as_raw_fd()) };
        setsockopt(&fd, ReceiveTimeout, &tv)
            .map_err(|e| AgentError::Hardware(format!("SO_RCVTIMEO: {}", e)))?;

        debug!("nl80211 connected, family id {}", family_id);
        Ok(Self { sock, family_id })
    }

    fn ifindex(&self, ifname: &str) -> Result<u32> {
        nix::net::if_::if_nametoindex(ifname)
            .map(|idx| idx as u32)
            .map_err(|_| AgentError::NotFound(format!("interface {}", ifname)))
    }

    fn send(
        &mut self,
        cmd: Nl80211Command,
        flags: &[NlmF],
        attrs: GenlBuffer<Nl80211Attr, Buffer>,
    ) -> Result<()> {
        let genl = Genlmsghdr::new(cmd, NL80211_GENL_VERSION, attrs);
        let msg = Nlmsghdr::new(
            None,
            self.family_id,
            NlmFFlags::new(flags),
            None,
            None,
            NlPayload::Payload(genl),
        );
        self.sock.send(msg).map_err(|e| map_ser_err("send", e))
    }

    /// Sends a request expecting a kernel ack, mapping a nack errno to the
    /// agent's error kinds.
    fn send_ack(
        &mut self,
        cmd: Nl80211Command,
        attrs: GenlBuffer<Nl80211Attr, Buffer>,
    ) -> Result<()> {
        self.send(cmd, &[NlmF::Request, NlmF::Ack], attrs)?;
        match self.sock.recv::<Nlmsg, Nl80211Payload>() {
            Ok(Some(_)) => Ok(()),
            // an armed SO_RCVTIMEO expiry surfaces as an empty read
            Ok(None) => Err(AgentError::Timeout(format!("{:?}: no ack", cmd))),
            Err(NlError::Nlmsgerr(e)) => Err(map_errno(cmd, -e.error)),
            Err(e) => Err(map_nl_err("ack", e)),
        }
    }

    /// Issues a dump and decodes each multi-part message with `decode`.
    /// Decode failures are collected, not fatal to the drain.
    fn dump<T, F>(
        &mut self,
        cmd: Nl80211Command,
        attrs: GenlBuffer<Nl80211Attr, Buffer>,
        mut decode: F,
    ) -> Result<(Vec<T>, Option<AgentError>)>
    where
        F: FnMut(&Nl80211Payload) -> Result<Option<T>>,
    {
        self.send(cmd, &[NlmF::Request, NlmF::Dump], attrs)?;
        let mut out = Vec::new();
        let mut failure = None;
        let mut done = false;
        for response in self.sock.iter::<Nlmsg, Nl80211Payload>(false) {
            let msg: Nlmsghdr<Nlmsg, Nl80211Payload> = match response {
                Ok(msg) => msg,
                // kernel rejected the request as a whole
                Err(NlError::Nlmsgerr(e)) => return Err(map_errno(cmd, -e.error)),
                Err(e) => return Err(map_nl_err("dump recv", e)),
            };
            if let Nlmsg::Done = msg.nl_type {
                done = true;
                break;
            }
            let genl = match msg.nl_payload {
                NlPayload::Payload(ref p) => p,
                _ => continue,
            };
            match decode(genl) {
                Ok(Some(item)) => out.push(item),
                Ok(None) => {}
                Err(e) => {
                    warn!("{:?}: skipping undecodable entry: {}", cmd, e);
                    failure = Some(e);
                }
            }
        }
        // the iterator ends silently when the receive timeout fires
        if !done {
            return Err(AgentError::Timeout(format!("{:?}: dump cut short", cmd)));
        }
        Ok((out, failure))
    }

    fn if_attrs(&self, ifname: &str) -> Result<GenlBuffer<Nl80211Attr, Buffer>> {
        let ifindex = self.ifindex(ifname)?;
        let mut attrs = GenlBuffer::new();
        attrs.push(
            Nlattr::new(false, false, Nl80211Attr::IfIndex, ifindex)
                .map_err(|e| AgentError::Decode(format!("ifindex attr: {}", e)))?,
        );
        Ok(attrs)
    }
}

fn decode_phy(genl: &Nl80211Payload) -> Result<Option<(u32, PhyInfo)>> {
    let mut handle = genl.get_attr_handle();
    let index = handle
        .get_attr_payload_as::<u32>(Nl80211Attr::Wiphy)
        .map_err(|e| AgentError::Decode(format!("wiphy index: {}", e)))?;
    let name = handle
        .get_attr_payload_as_with_len::<String>(Nl80211Attr::WiphyName)
        .map_err(|e| AgentError::Decode(format!("wiphy name: {}", e)))?;

    let mut info = PhyInfo {
        name,
        ..Default::default()
    };
    info.mac = handle
        .get_attribute(Nl80211Attr::Mac)
        .and_then(|a| MacAddr::from_slice(a.nla_payload.as_ref()).ok());
    info.tx_ant = handle
        .get_attr_payload_as::<u32>(Nl80211Attr::WiphyAntennaTx)
        .unwrap_or(0);
    info.rx_ant = handle
        .get_attr_payload_as::<u32>(Nl80211Attr::WiphyAntennaRx)
        .unwrap_or(0);
    info.tx_ant_avail = handle
        .get_attr_payload_as::<u32>(Nl80211Attr::WiphyAntennaAvailTx)
        .unwrap_or(0);
    info.rx_ant_avail = handle
        .get_attr_payload_as::<u32>(Nl80211Attr::WiphyAntennaAvailRx)
        .unwrap_or(0);

    if let Ok(bands) = handle.get_nested_attributes::<u16>(Nl80211Attr::WiphyBands) {
        for band in bands.iter() {
            let mut battrs = band
                .get_attr_handle::<Nl80211BandAttr>()
                .map_err(|e| AgentError::Decode(format!("band attrs: {}", e)))?;
            if let Ok(capa) = battrs.get_attr_payload_as::<u16>(Nl80211BandAttr::HtCapa) {
                info.ht_capa = capa;
            }
            if let Ok(capa) = battrs.get_attr_payload_as::<u32>(Nl80211BandAttr::VhtCapa) {
                info.vht_capa = capa;
            }
            let Ok(freqs) = battrs.get_nested_attributes::<u16>(Nl80211BandAttr::Frequencies)
            else {
                continue;
            };
            for freq in freqs.iter() {
                let fattrs = freq
                    .get_attr_handle::<Nl80211FrequencyAttr>()
                    .map_err(|e| AgentError::Decode(format!("freq attrs: {}", e)))?;
                let Ok(mhz) =
                    fattrs.get_attr_payload_as::<u32>(Nl80211FrequencyAttr::Frequency)
                else {
                    continue;
                };
                let Some(channel) = freq_to_channel(mhz) else {
                    continue;
                };
                let max_power = fattrs
                    .get_attr_payload_as::<u32>(Nl80211FrequencyAttr::MaxTxPower)
                    .map(|mbm| (mbm / 100) as u8)
                    .unwrap_or(0);
                info.channels.push(ChannelEntry {
                    channel: channel as u8,
                    freq: mhz,
                    disabled: fattrs
                        .get_attribute(Nl80211FrequencyAttr::Disabled)
                        .is_some(),
                    dfs: fattrs.get_attribute(Nl80211FrequencyAttr::Radar).is_some(),
                    max_power,
                });
            }
        }
    }
    Ok(Some((index, info)))
}

fn decode_vif(genl: &Nl80211Payload) -> Result<Option<(u32, String, MacAddr)>> {
    let handle = genl.get_attr_handle();
    let wiphy = handle
        .get_attr_payload_as::<u32>(Nl80211Attr::Wiphy)
        .map_err(|e| AgentError::Decode(format!("vif wiphy: {}", e)))?;
    let name = handle
        .get_attr_payload_as_with_len::<String>(Nl80211Attr::IfName)
        .map_err(|e| AgentError::Decode(format!("vif name: {}", e)))?;
    let addr = handle
        .get_attribute(Nl80211Attr::Mac)
        .ok_or_else(|| AgentError::Decode("vif without mac".to_string()))
        .and_then(|a| {
            MacAddr::from_slice(a.nla_payload.as_ref())
                .map_err(|e| AgentError::Decode(e.to_string()))
        })?;
    Ok(Some((wiphy, name, addr)))
}

fn decode_station(genl: &Nl80211Payload) -> Result<Option<StationInfo>> {
    let mut handle = genl.get_attr_handle();
    let addr = handle
        .get_attribute(Nl80211Attr::Mac)
        .ok_or_else(|| AgentError::Decode("station without mac".to_string()))
        .and_then(|a| {
            MacAddr::from_slice(a.nla_payload.as_ref())
                .map_err(|e| AgentError::Decode(e.to_string()))
        })?;
    let mut sta = StationInfo {
        addr,
        ..Default::default()
    };
    let mut info = handle
        .get_nested_attributes::<Nl80211StaInfo>(Nl80211Attr::StaInfo)
        .map_err(|e| AgentError::Decode(format!("sta info: {}", e)))?;
    if let Ok(signal) = info.get_attr_payload_as::<u8>(Nl80211StaInfo::Signal) {
        sta.signal = signal as i8 as i32;
    }
    sta.bytes_rx = info
        .get_attr_payload_as::<u32>(Nl80211StaInfo::RxBytes)
        .unwrap_or(0) as u64;
    sta.bytes_tx = info
        .get_attr_payload_as::<u32>(Nl80211StaInfo::TxBytes)
        .unwrap_or(0) as u64;
    sta.packets_rx = info
        .get_attr_payload_as::<u32>(Nl80211StaInfo::RxPackets)
        .unwrap_or(0) as u64;
    sta.packets_tx = info
        .get_attr_payload_as::<u32>(Nl80211StaInfo::TxPackets)
        .unwrap_or(0) as u64;
    sta.rate_tx = decode_bitrate(&mut info, Nl80211StaInfo::TxBitrate);
    sta.rate_rx = decode_bitrate(&mut info, Nl80211StaInfo::RxBitrate);
    Ok(Some(sta))
}

fn decode_bitrate(
    info: &mut neli::attr::AttrHandle<
        '_,
        GenlBuffer<Nl80211StaInfo, Buffer>,
        Nlattr<Nl80211StaInfo, Buffer>,
    >,
    which: Nl80211StaInfo,
) -> u32 {
    let Ok(rate) = info.get_nested_attributes::<Nl80211RateInfo>(which) else {
        return 0;
    };
    if let Ok(bitrate) = rate.get_attr_payload_as::<u32>(Nl80211RateInfo::Bitrate32) {
        return bitrate;
    }
    rate.get_attr_payload_as::<u16>(Nl80211RateInfo::Bitrate)
        .map(u32::from)
        .unwrap_or(0)
}

fn decode_survey(genl: &Nl80211Payload) -> Result<Option<SurveyRecord>> {
    let mut handle = genl.get_attr_handle();
    let info = handle
        .get_nested_attributes::<Nl80211SurveyInfo>(Nl80211Attr::SurveyInfo)
        .map_err(|e| AgentError::Decode(format!("survey info: {}", e)))?;
    let Ok(freq) = info.get_attr_payload_as::<u32>(Nl80211SurveyInfo::Frequency) else {
        return Ok(None);
    };
    let Some(channel) = freq_to_channel(freq) else {
        return Ok(None);
    };
    let get_u64 = |attr| info.get_attr_payload_as::<u64>(attr).unwrap_or(0);
    Ok(Some(SurveyRecord {
        channel,
        in_use: info.get_attribute(Nl80211SurveyInfo::InUse).is_some(),
        noise: info
            .get_attr_payload_as::<u8>(Nl80211SurveyInfo::Noise)
            .map(|n| n as i8 as i32)
            .unwrap_or(0),
        duration_ms: get_u64(Nl80211SurveyInfo::Time),
        chan_busy: get_u64(Nl80211SurveyInfo::TimeBusy),
        chan_busy_ext: get_u64(Nl80211SurveyInfo::TimeExtBusy),
        chan_rx: get_u64(Nl80211SurveyInfo::TimeRx),
        chan_tx: get_u64(Nl80211SurveyInfo::TimeTx),
        chan_self: 0,
    }))
}

fn decode_bss(genl: &Nl80211Payload) -> Result<Option<NeighborRecord>> {
    let mut handle = genl.get_attr_handle();
    let Ok(bss) = handle.get_nested_attributes::<Nl80211Bss>(Nl80211Attr::Bss) else {
        // interface-level message without a BSS block
        return Ok(None);
    };
    let bssid = bss
        .get_attribute(Nl80211Bss::Bssid)
        .ok_or_else(|| AgentError::Decode("bss without bssid".to_string()))
        .and_then(|a| {
            MacAddr::from_slice(a.nla_payload.as_ref())
                .map_err(|e| AgentError::Decode(e.to_string()))
        })?;
    let freq = bss
        .get_attr_payload_as::<u32>(Nl80211Bss::Frequency)
        .map_err(|e| AgentError::Decode(format!("bss frequency: {}", e)))?;
    let ies: &[u8] = bss
        .get_attribute(Nl80211Bss::InformationElements)
        .map(|a| a.nla_payload.as_ref())
        .unwrap_or(&[]);
    // DS param beats the frequency when both are present
    let channel = ie::ds_channel(ies)
        .or_else(|| freq_to_channel(freq))
        .ok_or_else(|| AgentError::Decode(format!("bss frequency {} unmapped", freq)))?;
    Ok(Some(NeighborRecord {
        bssid,
        ssid: ie::ssid(ies),
        channel,
        rssi: bss
            .get_attr_payload_as::<i32>(Nl80211Bss::SignalMbm)
            .map(|mbm| mbm / 100)
            .unwrap_or(0),
        tsf: bss.get_attr_payload_as::<u64>(Nl80211Bss::Tsf).unwrap_or(0),
        beacon_interval_tu: bss
            .get_attr_payload_as::<u16>(Nl80211Bss::BeaconInterval)
            .unwrap_or(0),
        last_seen_ms: bss
            .get_attr_payload_as::<u32>(Nl80211Bss::SeenMsAgo)
            .unwrap_or(0),
    }))
}

impl WirelessBackend for Nl80211Client {
    fn enumerate(&mut self) -> Result<(Vec<PhyInfo>, Vec<VifInfo>)> {
        let (phy_parts, failure) = self.dump(Nl80211Command::GetWiphy, GenlBuffer::new(), decode_phy)?;
        if let Some(e) = failure {
            return Err(e);
        }

        // wiphy dumps split one phy across messages; merge by index
        let mut by_index: BTreeMap<u32, PhyInfo> = BTreeMap::new();
        for (index, part) in phy_parts {
            let entry = by_index.entry(index).or_insert_with(|| PhyInfo {
                name: part.name.clone(),
                ..Default::default()
            });
            if entry.mac.is_none() {
                entry.mac = part.mac;
            }
            if entry.ht_capa == 0 {
                entry.ht_capa = part.ht_capa;
            }
            if entry.vht_capa == 0 {
                entry.vht_capa = part.vht_capa;
            }
            if entry.tx_ant == 0 {
                entry.tx_ant = part.tx_ant;
                entry.rx_ant = part.rx_ant;
                entry.tx_ant_avail = part.tx_ant_avail;
                entry.rx_ant_avail = part.rx_ant_avail;
            }
            entry.channels.extend(part.channels);
        }

        let (vif_parts, failure) =
            self.dump(Nl80211Command::GetInterface, GenlBuffer::new(), decode_vif)?;
        if let Some(e) = failure {
            return Err(e);
        }
        let vifs = vif_parts
            .into_iter()
            .filter_map(|(wiphy, name, addr)| {
                let Some(phy) = by_index.get(&wiphy) else {
                    warn!("{}: unknown wiphy index {}", name, wiphy);
                    return None;
                };
                Some(VifInfo {
                    name,
                    addr,
                    phy_name: phy.name.clone(),
                })
            })
            .collect();
        Ok((by_index.into_values().collect(), vifs))
    }

    fn tx_chainmask(&mut self, phy: &str) -> Result<u32> {
        let (phys, failure) = self.dump(Nl80211Command::GetWiphy, GenlBuffer::new(), decode_phy)?;
        if let Some(e) = failure {
            return Err(e);
        }
        phys.iter()
            .find(|(_, info)| info.name == phy)
            .map(|(_, info)| info.tx_ant)
            .ok_or_else(|| AgentError::NotFound(format!("phy {}", phy)))
    }

    fn assoclist(&mut self, ifname: &str) -> Result<Vec<StationInfo>> {
        let attrs = self.if_attrs(ifname)?;
        let (stations, failure) = self.dump(Nl80211Command::GetStation, attrs, decode_station)?;
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(stations)
    }

    fn survey(&mut self, ifname: &str) -> Result<Vec<SurveyRecord>> {
        let attrs = self.if_attrs(ifname)?;
        let (records, failure) = self.dump(Nl80211Command::GetSurvey, attrs, decode_survey)?;
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(records)
    }

    fn scan_trigger(
        &mut self,
        ifname: &str,
        channels: &[u32],
        _dwell_ms: u32,
        scan_type: ScanType,
    ) -> Result<()> {
        let mut attrs = self.if_attrs(ifname)?;
        if !matches!(scan_type, ScanType::Full) && !channels.is_empty() {
            let mut freqs = GenlBuffer::new();
            for (i, chan) in channels.iter().enumerate() {
                let freq = super::channel_to_freq(*chan)
                    .ok_or_else(|| AgentError::Decode(format!("channel {} unmapped", chan)))?;
                freqs.push(
                    Nlattr::new(false, false, i as u16, freq)
                        .map_err(|e| AgentError::Decode(format!("freq attr: {}", e)))?,
                );
            }
            attrs.push(
                Nlattr::new(true, false, Nl80211Attr::ScanFrequencies, freqs)
                    .map_err(|e| AgentError::Decode(format!("scan freqs: {}", e)))?,
            );
        }
        self.send_ack(Nl80211Command::TriggerScan, attrs)
    }

    fn scan_abort(&mut self, ifname: &str) -> Result<()> {
        let attrs = self.if_attrs(ifname)?;
        self.send_ack(Nl80211Command::AbortScan, attrs)
    }

    fn scan_dump(&mut self, ifname: &str) -> Result<ScanDump> {
        let attrs = self.if_attrs(ifname)?;
        let (neighbors, truncated) = self.dump(Nl80211Command::GetScan, attrs, decode_bss)?;
        Ok(ScanDump {
            neighbors,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn io_nl_err(kind: io::ErrorKind) -> NlError<Nlmsg, Nl80211Payload> {
        NlError::from(io::Error::from(kind))
    }

    #[test]
    fn test_receive_timeout_classified_as_timeout() {
        assert!(matches!(
            map_nl_err("recv", io_nl_err(io::ErrorKind::WouldBlock)),
            AgentError::Timeout(_)
        ));
        assert!(matches!(
            map_nl_err("recv", io_nl_err(io::ErrorKind::TimedOut)),
            AgentError::Timeout(_)
        ));
        assert!(matches!(
            map_nl_err("recv", io_nl_err(io::ErrorKind::ConnectionReset)),
            AgentError::Decode(_)
        ));
        assert!(matches!(
            map_nl_err(
                "recv",
                NlError::<Nlmsg, Nl80211Payload>::Msg("truncated".to_string())
            ),
            AgentError::Decode(_)
        ));
    }

    #[test]
    fn test_ser_error_classified() {
        let io_err = SerError::Wrapped(WrappedError::IOError(io::Error::from(
            io::ErrorKind::BrokenPipe,
        )));
        assert!(matches!(map_ser_err("send", io_err), AgentError::Hardware(_)));
        assert!(matches!(
            map_ser_err("send", SerError::UnexpectedEOB),
            AgentError::Decode(_)
        ));
    }

    #[test]
    fn test_nack_errno_mapping() {
        assert!(matches!(
            map_errno(Nl80211Command::TriggerScan, 19),
            AgentError::NotFound(_)
        ));
        assert!(matches!(
            map_errno(Nl80211Command::TriggerScan, 16),
            AgentError::Hardware(_)
        ));
    }
}
