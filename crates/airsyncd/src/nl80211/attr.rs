//! nl80211 command and attribute constants.
//!
//! Values follow /usr/include/linux/nl80211.h; only what the agent sends
//! or decodes is listed.

use neli::consts::genl::{Cmd, NlAttrType};
use neli::neli_enum;

pub const NL80211_GENL_NAME: &str = "nl80211";

#[neli_enum(serialized_type = "u8")]
#[non_exhaustive]
pub enum Nl80211Command {
    /// Dump request for all present wiphys.
    GetWiphy = 1,
    /// Dump request for interfaces.
    GetInterface = 5,
    /// Dump request for stations on an interface.
    GetStation = 17,
    /// Dump cached scan results.
    GetScan = 32,
    /// Start a scan.
    TriggerScan = 33,
    /// Dump per-channel survey data.
    GetSurvey = 50,
    /// Cancel an in-flight scan.
    AbortScan = 114,
}
impl Cmd for Nl80211Command {}

#[neli_enum(serialized_type = "u16")]
#[non_exhaustive]
pub enum Nl80211Attr {
    Unspecified = 0,
    /// Wiphy index (u32).
    Wiphy = 1,
    /// Wiphy name (string).
    WiphyName = 2,
    /// Interface index (u32).
    IfIndex = 3,
    /// Interface name (string).
    IfName = 4,
    /// Interface type (u32).
    IfType = 5,
    /// Hardware address (6 bytes).
    Mac = 6,
    /// Nested station info, see [`Nl80211StaInfo`].
    StaInfo = 21,
    /// Nested array of bands, see [`Nl80211BandAttr`].
    WiphyBands = 22,
    /// Nested array of frequencies to scan (u32 MHz each).
    ScanFrequencies = 44,
    /// Nested array of SSIDs to scan for.
    ScanSsids = 45,
    /// Nested BSS description, see [`Nl80211Bss`].
    Bss = 47,
    /// Nested survey results, see [`Nl80211SurveyInfo`].
    SurveyInfo = 81,
    /// Configured tx antenna bitmap (u32).
    WiphyAntennaTx = 104,
    /// Configured rx antenna bitmap (u32).
    WiphyAntennaRx = 105,
    /// Available tx antenna bitmap (u32).
    WiphyAntennaAvailTx = 112,
    /// Available rx antenna bitmap (u32).
    WiphyAntennaAvailRx = 113,
}
impl NlAttrType for Nl80211Attr {}

#[neli_enum(serialized_type = "u16")]
#[non_exhaustive]
pub enum Nl80211BandAttr {
    Invalid = 0,
    /// Nested array of frequency attributes.
    Frequencies = 1,
    Rates = 2,
    HtMcsSet = 3,
    /// HT capabilities mask (u16).
    HtCapa = 4,
    HtAmpduFactor = 5,
    HtAmpduDensity = 6,
    VhtMcsSet = 7,
    /// VHT capabilities mask (u32).
    VhtCapa = 8,
}
impl NlAttrType for Nl80211BandAttr {}

#[neli_enum(serialized_type = "u16")]
#[non_exhaustive]
pub enum Nl80211FrequencyAttr {
    Invalid = 0,
    /// Frequency in MHz (u32).
    Frequency = 1,
    /// Disabled in the current regulatory domain (flag).
    Disabled = 2,
    NoIr = 3,
    NoIbss = 4,
    /// Radar detection mandatory, i.e. DFS (flag).
    Radar = 5,
    /// Maximum transmission power in mBm (u32).
    MaxTxPower = 6,
}
impl NlAttrType for Nl80211FrequencyAttr {}

#[neli_enum(serialized_type = "u16")]
#[non_exhaustive]
pub enum Nl80211StaInfo {
    Unspecified = 0,
    InactiveTime = 1,
    /// Received bytes (u32).
    RxBytes = 2,
    /// Transmitted bytes (u32).
    TxBytes = 3,
    LLID = 4,
    PLID = 5,
    PlinkState = 6,
    /// Signal of last received PPDU (u8, dBm).
    Signal = 7,
    /// Nested current tx rate, see [`Nl80211RateInfo`].
    TxBitrate = 8,
    /// Received packets (u32).
    RxPackets = 9,
    /// Transmitted packets (u32).
    TxPackets = 10,
    TxRetries = 11,
    TxFailed = 12,
    SignalAvg = 13,
    /// Nested last rx rate, same layout as TxBitrate.
    RxBitrate = 14,
}
impl NlAttrType for Nl80211StaInfo {}

#[neli_enum(serialized_type = "u16")]
#[non_exhaustive]
pub enum Nl80211RateInfo {
    Unspecified = 0,
    /// Rate in 100 kbps units (u16).
    Bitrate = 1,
    Mcs = 2,
    MhzWidth40 = 3,
    ShortGi = 4,
    /// Rate in 100 kbps units (u32); preferred when present.
    Bitrate32 = 5,
}
impl NlAttrType for Nl80211RateInfo {}

#[neli_enum(serialized_type = "u16")]
#[non_exhaustive]
pub enum Nl80211SurveyInfo {
    Invalid = 0,
    /// Channel center frequency in MHz (u32).
    Frequency = 1,
    /// Noise in dBm (u8, signed).
    Noise = 2,
    /// Channel currently in use (flag).
    InUse = 3,
    /// Active observation time, ms (u64).
    Time = 4,
    /// Time the channel was sensed busy, ms (u64).
    TimeBusy = 5,
    /// Time the extension channel was sensed busy, ms (u64).
    TimeExtBusy = 6,
    /// Time spent receiving, ms (u64).
    TimeRx = 7,
    /// Time spent transmitting, ms (u64).
    TimeTx = 8,
}
impl NlAttrType for Nl80211SurveyInfo {}

#[neli_enum(serialized_type = "u16")]
#[non_exhaustive]
pub enum Nl80211Bss {
    Invalid = 0,
    /// BSSID (6 bytes).
    Bssid = 1,
    /// Frequency in MHz (u32).
    Frequency = 2,
    /// TSF of the received probe response/beacon (u64).
    Tsf = 3,
    /// Beacon interval in TUs (u16).
    BeaconInterval = 4,
    Capability = 5,
    /// Raw information elements from the probe response/beacon.
    InformationElements = 6,
    /// Signal strength in mBm (i32).
    SignalMbm = 7,
    SignalUnspec = 8,
    Status = 9,
    /// Age of this BSS entry in ms (u32).
    SeenMsAgo = 10,
}
impl NlAttrType for Nl80211Bss {}
