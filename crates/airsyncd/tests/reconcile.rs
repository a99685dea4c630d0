//! End-to-end reconciliation tests driving the agent through the mock
//! backend and the in-memory store.

use airsyncd::agent::{Agent, RecordingApplier};
use airsyncd::config::AgentConfig;
use airsyncd::nl80211::MockBackend;
use airsyncd::publish::RecordingPublisher;
use airsyncd::registry::StationInfo;
use airsyncd::store::{MemStore, SectionSnapshot};
use airsync_common::{MacAddr, Presence, RadioType, ScanType, SurveyRecord};
use std::sync::{Arc, Mutex};

struct Harness {
    agent: Agent,
    publisher: Arc<Mutex<RecordingPublisher>>,
    applier: Arc<Mutex<RecordingApplier>>,
    store: Arc<Mutex<MemStore>>,
    backend: Arc<Mutex<MockBackend>>,
}

fn harness() -> Harness {
    harness_with(MemStore::one_radio(), MockBackend::one_radio())
}

fn harness_with(store: MemStore, backend: MockBackend) -> Harness {
    let publisher = Arc::new(Mutex::new(RecordingPublisher::default()));
    let applier = Arc::new(Mutex::new(RecordingApplier::default()));
    let store = Arc::new(Mutex::new(store));
    let backend = Arc::new(Mutex::new(backend));
    let mut agent = Agent::new(
        AgentConfig::default(),
        Box::new(Arc::clone(&store)),
        Box::new(Arc::clone(&backend)),
        Box::new(Arc::clone(&publisher)),
        Box::new(Arc::clone(&applier)),
    );
    agent.init().unwrap();
    Harness {
        agent,
        publisher,
        applier,
        store,
        backend,
    }
}

#[test]
fn test_initial_publish_resolves_radio_facts() {
    let mut h = harness();
    h.agent.publish_initial().unwrap();

    let publisher = h.publisher.lock().unwrap();
    let state = publisher.last_radio_state("wifi0").expect("radio state");
    assert_eq!(state.enabled.get(), Some(&true));
    assert_eq!(state.channel.get(), Some(&36));
    // txpower absent in the store means max power
    assert_eq!(state.tx_power.get(), Some(&32));
    assert_eq!(state.bcn_int.get(), Some(&100));
    assert_eq!(state.country.get(), Some(&"CA".to_string()));
    assert_eq!(state.hw_mode.get().map(String::as_str), Some("11ac"));
    assert_eq!(state.ht_mode.get().map(String::as_str), Some("HT80"));
    assert_eq!(state.freq_band.get().map(String::as_str), Some("5GL"));
    assert_eq!(state.allowed_channels.get(), Some(&vec![36, 40, 52]));
    assert_eq!(state.mac.get(), Some(&MacAddr([2, 0, 0, 0, 0, 1])));
    // channel 52 is DFS, so the DFS knobs ride along
    assert_eq!(state.hw_config.get("dfs_enable").map(String::as_str), Some("1"));

    // initial publish also emits the config record with the driver name
    let conf = &publisher.radio_configs[0];
    assert_eq!(conf.hw_type.get().map(String::as_str), Some("ath10k"));

    let vif = publisher.last_vif_state("home-ap-50").expect("vif state");
    assert_eq!(vif.mode.get().map(String::as_str), Some("ap"));
    assert_eq!(vif.ssid.get().map(String::as_str), Some("backhaul"));
    assert_eq!(vif.mac.get(), Some(&MacAddr([2, 0, 0, 0, 0, 0x50])));
    assert_eq!(vif.associated_clients.get(), Some(&Vec::new()));
    assert_eq!(vif.security.get("encryption").map(String::as_str), Some("WPA-PSK"));
}

#[test]
fn test_passes_rebuild_state_from_scratch() {
    let mut h = harness();
    h.agent.run_pass().unwrap();
    {
        let publisher = h.publisher.lock().unwrap();
        let state = publisher.last_radio_state("wifi0").unwrap();
        assert_eq!(state.channel.get(), Some(&36));
    }

    // the option disappearing must not leave a stale channel behind
    h.store.lock().unwrap().remove_option("wifi0", "channel");
    h.agent.run_pass().unwrap();

    let publisher = h.publisher.lock().unwrap();
    let state = publisher.last_radio_state("wifi0").unwrap();
    assert!(state.channel.is_unset());
    assert_eq!(state.enabled.get(), Some(&true));
}

#[test]
fn test_store_is_released_every_pass() {
    let mut h = harness();
    h.agent.publish_initial().unwrap();
    h.agent.run_pass().unwrap();
    h.agent.run_pass().unwrap();

    let store = h.store.lock().unwrap();
    assert!(store.loads >= 3);
    assert_eq!(store.loads, store.unloads);
}

#[test]
fn test_config_set_defers_apply_to_next_pass() {
    let mut h = harness();
    let mut rconf = airsync_common::RadioState::new("wifi0");
    rconf.channel = Presence::Set(40);
    let changed = airsync_common::RadioConfigChanged {
        channel: true,
        ..Default::default()
    };
    h.agent.radio_config_set(&rconf, &changed).unwrap();

    // committed to the store immediately, applied only on the next pass
    assert_eq!(h.store.lock().unwrap().commits, 1);
    assert!(h.agent.reload_pending());
    assert_eq!(h.applier.lock().unwrap().applied, 0);

    h.agent.run_pass().unwrap();
    assert!(!h.agent.reload_pending());
    assert_eq!(h.applier.lock().unwrap().applied, 1);

    let publisher = h.publisher.lock().unwrap();
    let state = publisher.last_radio_state("wifi0").unwrap();
    assert_eq!(state.channel.get(), Some(&40));
}

#[test]
fn test_rejected_config_set_leaves_no_reload_pending() {
    let mut h = harness();
    let mut rconf = airsync_common::RadioState::new("wifi0");
    rconf.freq_band = Presence::Set("2.4G".to_string());
    rconf.hw_mode = Presence::Set("11ac".to_string());
    rconf.ht_mode = Presence::Set("HT80".to_string());
    let changed = airsync_common::RadioConfigChanged {
        hw_mode: true,
        ..Default::default()
    };

    // 11ac has no 2.4G translation; the set is refused outright
    let err = h.agent.radio_config_set(&rconf, &changed).unwrap_err();
    assert!(matches!(err, airsyncd::AgentError::Unsupported(_)));

    // nothing was staged: no reload flag, no store traffic, no apply
    assert!(!h.agent.reload_pending());
    {
        let store = h.store.lock().unwrap();
        assert_eq!(store.loads, 0);
        assert_eq!(store.commits, 0);
    }
    h.agent.run_pass().unwrap();
    assert_eq!(h.applier.lock().unwrap().applied, 0);
}

#[test]
fn test_clients_query_feeds_registry() {
    let mut h = harness();
    let sta = StationInfo {
        addr: MacAddr([0xaa, 0, 0, 0, 0, 1]),
        signal: -52,
        rate_tx: 866_000,
        ..Default::default()
    };
    h.backend
        .lock()
        .unwrap()
        .stations
        .insert("home_ap_50".to_string(), vec![sta]);

    let fired = Arc::new(Mutex::new(Vec::new()));
    let fired2 = Arc::clone(&fired);
    h.agent
        .stats_clients_get("home-ap-50", RadioType::Band5GL, move |report, ok| {
            fired2.lock().unwrap().push((report.records.len(), ok));
        })
        .unwrap();
    assert_eq!(*fired.lock().unwrap(), vec![(1, true)]);

    // the association list now shows up in the published VIF state
    h.agent.run_pass().unwrap();
    let publisher = h.publisher.lock().unwrap();
    let vif = publisher.last_vif_state("home-ap-50").unwrap();
    assert_eq!(
        vif.associated_clients.get(),
        Some(&vec![MacAddr([0xaa, 0, 0, 0, 0, 1])])
    );
}

#[test]
fn test_clients_query_failure_still_fires_callback() {
    let mut h = harness();
    h.backend.lock().unwrap().fail_assoclist = true;

    let fired = Arc::new(Mutex::new(Vec::new()));
    let fired2 = Arc::clone(&fired);
    let err = h
        .agent
        .stats_clients_get("home-ap-50", RadioType::Band5GL, move |report, ok| {
            fired2.lock().unwrap().push((report.records.len(), ok));
        })
        .unwrap_err();
    assert!(matches!(err, airsyncd::AgentError::Decode(_)));
    assert_eq!(*fired.lock().unwrap(), vec![(0, false)]);
}

#[test]
fn test_survey_updates_serving_channel_noise() {
    let mut h = harness();
    h.backend.lock().unwrap().surveys.insert(
        "home_ap_50".to_string(),
        vec![
            SurveyRecord {
                channel: 40,
                noise: -89,
                ..Default::default()
            },
            SurveyRecord {
                channel: 36,
                in_use: true,
                noise: -95,
                chan_busy: 120,
                ..Default::default()
            },
        ],
    );

    let fired = Arc::new(Mutex::new(Vec::new()));
    let fired2 = Arc::clone(&fired);
    h.agent
        .stats_survey_get("home-ap-50", RadioType::Band5GL, move |report, ok| {
            fired2.lock().unwrap().push((report.records.len(), ok));
        })
        .unwrap();
    assert_eq!(*fired.lock().unwrap(), vec![(2, true)]);
    assert_eq!(h.agent.registry.find_vif("home_ap_50").unwrap().noise, -95);
}

#[test]
fn test_scan_callback_fires_exactly_once() {
    let mut h = harness();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let f = Arc::clone(&fired);
    h.agent
        .scan_start(
            "wifi0",
            &[36, 40],
            110,
            ScanType::OffChannel,
            Box::new(move |ok| f.lock().unwrap().push(ok)),
        )
        .unwrap();
    assert!(fired.lock().unwrap().is_empty());

    let results = h.agent.scan_results("wifi0", RadioType::Band5GL).unwrap();
    assert!(results.truncated.is_none());
    assert_eq!(*fired.lock().unwrap(), vec![true]);

    // draining again must not re-fire the callback
    h.agent.scan_results("wifi0", RadioType::Band5GL).unwrap();
    assert_eq!(*fired.lock().unwrap(), vec![true]);

    let backend = h.backend.lock().unwrap();
    assert_eq!(backend.triggers.len(), 1);
    assert_eq!(backend.triggers[0].0, "phy1");
    assert_eq!(backend.triggers[0].1, vec![36, 40]);
}

#[test]
fn test_failed_trigger_reports_synchronously() {
    let mut h = harness();
    h.backend.lock().unwrap().fail_trigger = true;

    let fired = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::clone(&fired);
    let err = h
        .agent
        .scan_start(
            "wifi0",
            &[],
            0,
            ScanType::Full,
            Box::new(move |ok| f.lock().unwrap().push(ok)),
        )
        .unwrap_err();
    assert!(matches!(err, airsyncd::AgentError::Hardware(_)));
    assert_eq!(*fired.lock().unwrap(), vec![false]);
}

#[test]
fn test_new_scan_supersedes_pending_one() {
    let mut h = harness();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let f = Arc::clone(&fired);
    h.agent
        .scan_start(
            "wifi0",
            &[36],
            110,
            ScanType::OnChannel,
            Box::new(move |ok| f.lock().unwrap().push((1, ok))),
        )
        .unwrap();
    let f = Arc::clone(&fired);
    h.agent
        .scan_start(
            "wifi0",
            &[40],
            110,
            ScanType::OffChannel,
            Box::new(move |ok| f.lock().unwrap().push((2, ok))),
        )
        .unwrap();

    // the first request is failed out the moment the second lands
    assert_eq!(*fired.lock().unwrap(), vec![(1, false)]);

    h.agent.scan_results("wifi0", RadioType::Band5GL).unwrap();
    assert_eq!(*fired.lock().unwrap(), vec![(1, false), (2, true)]);
}

#[test]
fn test_scan_stop_fails_pending_callback() {
    let mut h = harness();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let f = Arc::clone(&fired);
    h.agent
        .scan_start(
            "wifi0",
            &[36],
            110,
            ScanType::OnChannel,
            Box::new(move |ok| f.lock().unwrap().push(ok)),
        )
        .unwrap();
    h.agent.scan_stop("wifi0").unwrap();
    assert_eq!(*fired.lock().unwrap(), vec![false]);
    assert_eq!(h.backend.lock().unwrap().aborts, vec!["phy1".to_string()]);
}

#[test]
fn test_truncated_dump_keeps_partial_results() {
    let mut h = harness();
    {
        let mut backend = h.backend.lock().unwrap();
        backend.neighbors.insert(
            "phy1".to_string(),
            vec![
                airsync_common::NeighborRecord {
                    bssid: MacAddr([0x10, 0, 0, 0, 0, 1]),
                    channel: 36,
                    ..Default::default()
                },
                airsync_common::NeighborRecord {
                    bssid: MacAddr([0x10, 0, 0, 0, 0, 2]),
                    channel: 40,
                    ..Default::default()
                },
            ],
        );
        backend.truncate_scan_dump = true;
    }

    let results = h.agent.scan_results("wifi0", RadioType::Band5GL).unwrap();
    assert_eq!(results.report.records.len(), 1);
    assert!(matches!(
        results.truncated,
        Some(airsyncd::AgentError::Decode(_))
    ));
}

#[test]
fn test_chainmask_query() {
    let mut h = harness();
    let mask = h
        .agent
        .stats_chainmask_get("wifi0", RadioType::Band5GL)
        .unwrap();
    assert_eq!(mask.value, 3);
}

#[test]
fn test_temperature_reads_hwmon() {
    let dir = tempfile::tempdir().unwrap();
    let hwmon = dir.path().join("phy1/device/hwmon/hwmon2");
    std::fs::create_dir_all(&hwmon).unwrap();
    std::fs::write(hwmon.join("temp1_input"), "55000\n").unwrap();

    let mut cfg = AgentConfig::default();
    cfg.sysfs_root = dir.path().to_string_lossy().into_owned();
    let mut agent = Agent::new(
        cfg,
        Box::new(MemStore::one_radio()),
        Box::new(MockBackend::one_radio()),
        Box::new(RecordingPublisher::default()),
        Box::new(RecordingApplier::default()),
    );
    agent.init().unwrap();

    let temp = agent.stats_temp_get("wifi0", RadioType::Band5GL).unwrap();
    assert_eq!(temp.value_c, 55);

    // a phy without a hwmon node is a hardware error, not a panic
    let err = agent
        .stats_temp_get("wifi1", RadioType::Band5G)
        .unwrap_err();
    assert!(matches!(err, airsyncd::AgentError::Hardware(_)));
}

#[test]
fn test_unknown_radio_section_does_not_abort_pass() {
    let mut store = MemStore::one_radio();
    store.push_section(
        SectionSnapshot::new("wifi9", "wifi-device").with_option("channel", "1"),
    );
    let mut h = harness_with(store, MockBackend::one_radio());

    // wifi9 has no phy; the pass still publishes wifi0
    h.agent.run_pass().unwrap();
    let publisher = h.publisher.lock().unwrap();
    assert!(publisher.last_radio_state("wifi0").is_some());
    assert!(publisher.last_radio_state("wifi9").is_none());
}
