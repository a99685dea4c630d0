//! Radio config translation.
//!
//! Maps `wifi-device` sections to presence-flagged radio state records and
//! config-set requests back to section options. Value conventions differ
//! between the store and the schema: UCI txpower 0 means "use max", the
//! schema spells maximum as 32.

use crate::error::{AgentError, Result};
use crate::modemap;
use crate::registry::Phy;
use crate::store::{ConfigStore, SectionSnapshot};
use airsync_common::{Presence, RadioConfigChanged, RadioState};
use tracing::error;

/// Schema spelling of "maximum transmit power".
pub const TX_POWER_MAX_SENTINEL: u32 = 32;
/// Store spelling of "maximum transmit power".
pub const UCI_TX_POWER_USE_MAX: u32 = 0;
pub const BCN_INT_DEFAULT: u32 = 100;
pub const BCN_INT_MIN: u32 = 50;
pub const BCN_INT_MAX: u32 = 400;
/// Product default regulatory domain.
pub const DEFAULT_COUNTRY: &str = "CA";
/// Channel bandwidth written alongside a mode change.
pub const DEFAULT_CHANBW: u32 = 20;

pub const SECTION_WIFI_DEVICE: &str = "wifi-device";

/// Declared attribute schema of a `wifi-device` section; every attribute
/// is independently optional.
#[derive(Debug, Clone, Default)]
pub struct RadioSection {
    pub disabled: Option<bool>,
    pub channel: Option<u32>,
    pub txpower: Option<u32>,
    pub beacon_int: Option<u32>,
    pub htmode: Option<String>,
    pub hwmode: Option<String>,
    pub country: Option<String>,
    pub chanbw: Option<u32>,
    pub tx_antenna: Option<u32>,
    pub freq_band: Option<String>,
}

impl RadioSection {
    pub fn parse(s: &SectionSnapshot) -> Self {
        Self {
            disabled: s.get_bool("disabled"),
            channel: s.get_u32("channel"),
            txpower: s.get_u32("txpower"),
            beacon_int: s.get_u32("beacon_int"),
            htmode: s.get("htmode").map(str::to_string),
            hwmode: s.get("hwmode").map(str::to_string),
            country: s.get("country").map(str::to_string),
            chanbw: s.get_u32("chanbw"),
            tx_antenna: s.get_u32("tx_antenna"),
            freq_band: s.get("freq_band").map(str::to_string),
        }
    }
}

/// Builds the published state record for one radio section, given the phy
/// backing it. Fields that cannot be resolved stay unset.
pub fn build_radio_state(section: &SectionSnapshot, phy: &Phy) -> RadioState {
    let sec = RadioSection::parse(section);
    let mut state = RadioState::new(&section.name);

    state.enabled = Presence::Set(!sec.disabled.unwrap_or(false));
    if let Some(channel) = sec.channel {
        state.channel = Presence::Set(channel);
    }

    state.tx_power = Presence::Set(match sec.txpower {
        Some(UCI_TX_POWER_USE_MAX) | None => TX_POWER_MAX_SENTINEL,
        Some(power) => power,
    });
    state.bcn_int = Presence::Set(sec.beacon_int.unwrap_or(BCN_INT_DEFAULT));
    state.tx_chainmask = Presence::Set(sec.tx_antenna.unwrap_or(phy.tx_ant));
    state.country = Presence::Set(sec.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()));

    match (&sec.htmode, &sec.hwmode) {
        (Some(ht), Some(hw)) => match modemap::to_schema(Some(ht), hw) {
            Ok((hw_mode, ht_mode)) => {
                state.hw_mode = Presence::Set(hw_mode.to_string());
                state.ht_mode = ht_mode.map(str::to_string).into();
            }
            Err(e) => {
                // leave both unset rather than publish an untranslated mode
                error!("{}: failed to decode ht/hwmode: {}", section.name, e);
            }
        },
        (None, Some(hw)) => match modemap::to_schema(None, hw) {
            Ok((hw_mode, _)) => state.hw_mode = Presence::Set(hw_mode.to_string()),
            Err(e) => error!("{}: failed to decode hwmode: {}", section.name, e),
        },
        _ => {}
    }

    state.freq_band = match sec.freq_band {
        Some(band) => Presence::Set(band),
        None => phy.band().map(str::to_string).into(),
    };
    state.allowed_channels = Presence::Set(phy.allowed_channels());
    state.mac = phy.mac.into();

    if phy.has_dfs() {
        state.hw_config.insert("dfs_enable".to_string(), "1".to_string());
        state.hw_config.insert("dfs_ignorecac".to_string(), "0".to_string());
        state.hw_config.insert("dfs_usenol".to_string(), "1".to_string());
    }

    state
}

/// Translates the changed fields of a config-set request into section
/// options. Fails without side effects when the mode combination has no
/// compatibility entry.
pub fn build_radio_options(
    rconf: &RadioState,
    changed: &RadioConfigChanged,
) -> Result<Vec<(String, String)>> {
    let mut opts: Vec<(String, String)> = Vec::new();

    if changed.channel {
        if let Some(channel) = rconf.channel.get() {
            opts.push(("channel".to_string(), channel.to_string()));
        }
    }
    if changed.enabled {
        let enabled = rconf.enabled.get().copied().unwrap_or(false);
        opts.push(("disabled".to_string(), if enabled { "0" } else { "1" }.to_string()));
    }
    if changed.tx_power {
        if let Some(power) = rconf.tx_power.get() {
            opts.push(("txpower".to_string(), power.to_string()));
        }
    }
    if changed.tx_chainmask {
        if let Some(mask) = rconf.tx_chainmask.get() {
            opts.push(("tx_antenna".to_string(), mask.to_string()));
        }
    }
    if changed.country {
        if let Some(country) = rconf.country.get() {
            opts.push(("country".to_string(), country.clone()));
        }
    }
    if changed.bcn_int {
        let mut bcn_int = rconf.bcn_int.get().copied().unwrap_or(BCN_INT_DEFAULT);
        if !(BCN_INT_MIN..=BCN_INT_MAX).contains(&bcn_int) {
            bcn_int = BCN_INT_DEFAULT;
        }
        opts.push(("beacon_int".to_string(), bcn_int.to_string()));
    }

    if changed.ht_mode || changed.hw_mode || changed.freq_band {
        let band = rconf
            .freq_band
            .get()
            .map(String::as_str)
            .ok_or_else(|| AgentError::Unsupported("mode change without freq_band".to_string()))?;
        let hw_mode = rconf
            .hw_mode
            .get()
            .map(String::as_str)
            .ok_or_else(|| AgentError::Unsupported("mode change without hw_mode".to_string()))?;
        let ht_mode = rconf.ht_mode.get().map(String::as_str);
        let (uci_htmode, uci_hwmode) = modemap::to_uci(band, ht_mode, hw_mode)?;
        if let Some(htmode) = uci_htmode {
            opts.push(("htmode".to_string(), htmode.to_string()));
        }
        opts.push(("hwmode".to_string(), uci_hwmode.to_string()));
        opts.push(("chanbw".to_string(), DEFAULT_CHANBW.to_string()));
    }

    Ok(opts)
}

/// Applies a radio config-set to the persistent store. The store is only
/// touched after every translation succeeded; it is released before
/// returning regardless of outcome.
pub fn radio_config_set(
    store: &mut dyn ConfigStore,
    rconf: &RadioState,
    changed: &RadioConfigChanged,
) -> Result<()> {
    let opts = build_radio_options(rconf, changed)?;

    store.load()?;
    let outcome = store
        .set_options(&rconf.if_name, &opts)
        .and_then(|_| store.commit());
    store.unload();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PhyInfo, Registry};

    fn test_phy(reg: &mut Registry) {
        reg.upsert_phy(PhyInfo {
            name: "phy1".to_string(),
            tx_ant: 3,
            channels: vec![
                crate::registry::ChannelEntry { channel: 36, freq: 5180, ..Default::default() },
                crate::registry::ChannelEntry { channel: 52, freq: 5260, dfs: true, ..Default::default() },
            ],
            ..Default::default()
        })
        .unwrap();
    }

    fn section() -> SectionSnapshot {
        SectionSnapshot::new("wifi0", SECTION_WIFI_DEVICE)
            .with_option("channel", "36")
            .with_option("disabled", "0")
    }

    #[test]
    fn test_tx_power_sentinel_remap() {
        let mut reg = Registry::new();
        test_phy(&mut reg);
        let phy = reg.find_phy("phy1").unwrap();

        let state = build_radio_state(&section().with_option("txpower", "0"), phy);
        assert_eq!(state.tx_power.get(), Some(&TX_POWER_MAX_SENTINEL));

        let state = build_radio_state(&section().with_option("txpower", "17"), phy);
        assert_eq!(state.tx_power.get(), Some(&17));

        // absent defaults to the max sentinel too
        let state = build_radio_state(&section(), phy);
        assert_eq!(state.tx_power.get(), Some(&32));
    }

    #[test]
    fn test_defaults_and_dfs_block() {
        let mut reg = Registry::new();
        test_phy(&mut reg);
        let phy = reg.find_phy("phy1").unwrap();

        let state = build_radio_state(&section(), phy);
        assert_eq!(state.enabled.get(), Some(&true));
        assert_eq!(state.channel.get(), Some(&36));
        assert_eq!(state.bcn_int.get(), Some(&BCN_INT_DEFAULT));
        assert_eq!(state.country.get(), Some(&DEFAULT_COUNTRY.to_string()));
        assert_eq!(state.tx_chainmask.get(), Some(&3));
        assert_eq!(state.allowed_channels.get(), Some(&vec![36, 52]));
        assert_eq!(state.hw_config.get("dfs_enable").map(String::as_str), Some("1"));
        assert_eq!(state.hw_config.get("dfs_usenol").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_mode_decode() {
        let mut reg = Registry::new();
        test_phy(&mut reg);
        let phy = reg.find_phy("phy1").unwrap();

        let state = build_radio_state(
            &section().with_option("htmode", "VHT80").with_option("hwmode", "11a"),
            phy,
        );
        assert_eq!(state.hw_mode.get().map(String::as_str), Some("11ac"));
        assert_eq!(state.ht_mode.get().map(String::as_str), Some("HT80"));

        // unknown combination publishes neither field
        let state = build_radio_state(
            &section().with_option("htmode", "VHT80").with_option("hwmode", "11g"),
            phy,
        );
        assert!(state.hw_mode.is_unset());
        assert!(state.ht_mode.is_unset());
    }

    #[test]
    fn test_write_clamps_beacon_interval() {
        let mut rconf = RadioState::new("wifi0");
        rconf.bcn_int = Presence::Set(1000);
        let changed = RadioConfigChanged { bcn_int: true, ..Default::default() };
        let opts = build_radio_options(&rconf, &changed).unwrap();
        assert_eq!(opts, vec![("beacon_int".to_string(), "100".to_string())]);

        rconf.bcn_int = Presence::Set(200);
        let opts = build_radio_options(&rconf, &changed).unwrap();
        assert_eq!(opts[0].1, "200");
    }

    #[test]
    fn test_write_only_changed_fields() {
        let mut rconf = RadioState::new("wifi0");
        rconf.channel = Presence::Set(149);
        rconf.tx_power = Presence::Set(20);
        rconf.enabled = Presence::Set(false);
        let changed = RadioConfigChanged { channel: true, enabled: true, ..Default::default() };
        let opts = build_radio_options(&rconf, &changed).unwrap();
        assert!(opts.contains(&("channel".to_string(), "149".to_string())));
        assert!(opts.contains(&("disabled".to_string(), "1".to_string())));
        assert!(!opts.iter().any(|(k, _)| k == "txpower"));
    }

    #[test]
    fn test_unsupported_mode_fails_before_store() {
        let mut rconf = RadioState::new("wifi0");
        rconf.freq_band = Presence::Set("2.4G".to_string());
        rconf.hw_mode = Presence::Set("11ac".to_string());
        rconf.ht_mode = Presence::Set("HT80".to_string());
        let changed = RadioConfigChanged { hw_mode: true, ..Default::default() };

        let mut store = crate::store::MemStore::new(vec![section()]);
        let err = radio_config_set(&mut store, &rconf, &changed).unwrap_err();
        assert!(matches!(err, AgentError::Unsupported(_)));
        assert_eq!(store.loads, 0);
        assert_eq!(store.commits, 0);
    }
}
