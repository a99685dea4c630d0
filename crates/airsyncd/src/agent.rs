//! Agent context: owns the registry, the store, the netlink backend and
//! the publisher, and drives one reconciliation pass at a time.
//!
//! All shared daemon state lives here; the single-threaded execution
//! model (one lock around the agent) is what serializes config-sets and
//! stats calls against reconciliation passes.

use crate::config::AgentConfig;
use crate::error::Result;
use crate::ifmap::IfMap;
use crate::nl80211::WirelessBackend;
use crate::publish::StatePublisher;
use crate::radio::{self, SECTION_WIFI_DEVICE};
use crate::registry::Registry;
use crate::store::{ConfigStore, SectionSnapshot};
use crate::vif::{self, SECTION_WIFI_IFACE};
use airsync_common::{
    Presence, RadioConfigChanged, RadioState, VifConfigChanged, VifState,
};
use std::collections::HashMap;
use std::process::Command;
use tracing::{debug, info, warn};

/// Applies committed config to the running system when a pending reload
/// is consumed.
pub trait ConfigApplier: Send {
    fn apply(&mut self) -> Result<()>;
}

/// Runs the configured apply command through the shell.
pub struct ShellApplier {
    command: String,
}

impl ShellApplier {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

impl ConfigApplier for ShellApplier {
    fn apply(&mut self) -> Result<()> {
        let status = Command::new("sh").arg("-c").arg(&self.command).status()?;
        if !status.success() {
            warn!("apply command '{}' exited with {}", self.command, status);
        }
        Ok(())
    }
}

/// Counts apply invocations, for tests.
#[derive(Default)]
pub struct RecordingApplier {
    pub applied: u32,
}

impl ConfigApplier for RecordingApplier {
    fn apply(&mut self) -> Result<()> {
        self.applied += 1;
        Ok(())
    }
}

// Lets a caller keep a handle on the applier it hands the agent.
impl<A: ConfigApplier> ConfigApplier for std::sync::Arc<std::sync::Mutex<A>> {
    fn apply(&mut self) -> Result<()> {
        self.lock()
            .map_err(|_| crate::error::AgentError::Store("applier lock poisoned".to_string()))?
            .apply()
    }
}

/// Completion callback for asynchronous scan requests. Invoked exactly
/// once per request with a success flag.
pub type ScanCb = Box<dyn FnOnce(bool) + Send>;

pub struct Agent {
    pub cfg: AgentConfig,
    pub ifmap: IfMap,
    pub registry: Registry,
    pub(crate) store: Box<dyn ConfigStore>,
    pub(crate) backend: Box<dyn WirelessBackend>,
    pub(crate) publisher: Box<dyn StatePublisher>,
    applier: Box<dyn ConfigApplier>,
    reload_pending: bool,
    pub(crate) pending_scans: HashMap<String, ScanCb>,
}

impl Agent {
    pub fn new(
        cfg: AgentConfig,
        store: Box<dyn ConfigStore>,
        backend: Box<dyn WirelessBackend>,
        publisher: Box<dyn StatePublisher>,
        applier: Box<dyn ConfigApplier>,
    ) -> Self {
        let ifmap = IfMap::from_entries(&cfg.name_map);
        Self {
            cfg,
            ifmap,
            registry: Registry::new(),
            store,
            backend,
            publisher,
            applier,
            reload_pending: false,
            pending_scans: HashMap::new(),
        }
    }

    /// Enumerates hardware into the registry. The netlink backend must be
    /// connected before this runs.
    pub fn init(&mut self) -> Result<()> {
        self.registry.init(self.backend.as_mut())
    }

    pub fn reload_pending(&self) -> bool {
        self.reload_pending
    }

    /// Accepts a radio config-set. Changes are committed to the store and
    /// applied on the next reconciliation tick, never live.
    pub fn radio_config_set(
        &mut self,
        rconf: &RadioState,
        changed: &RadioConfigChanged,
    ) -> Result<()> {
        radio::radio_config_set(self.store.as_mut(), rconf, changed)?;
        self.reload_pending = true;
        Ok(())
    }

    /// Accepts a VIF config-set, same deferral rules as radios.
    pub fn vif_config_set(&mut self, vconf: &VifState, changed: &VifConfigChanged) -> Result<()> {
        vif::vif_config_set(self.store.as_mut(), vconf, changed)?;
        self.reload_pending = true;
        Ok(())
    }

    /// Startup walk: publishes both the state and the derived config
    /// record for every configured radio and VIF.
    pub fn publish_initial(&mut self) -> Result<()> {
        self.refresh_all(true)
    }

    /// One reconciliation pass: consume a pending reload, then republish
    /// state for everything configured.
    pub fn run_pass(&mut self) -> Result<()> {
        if self.reload_pending {
            debug!("pass: applying reloaded config");
            self.reload_pending = false;
            if let Err(e) = self.applier.apply() {
                warn!("config apply failed: {}", e);
            }
        }
        self.refresh_all(false)
    }

    fn refresh_all(&mut self, publish_config: bool) -> Result<()> {
        // snapshot sections up front so the store is never held while
        // entries are processed
        self.store.load()?;
        let radios = self.store.sections_of_type(SECTION_WIFI_DEVICE);
        let vifs = self.store.sections_of_type(SECTION_WIFI_IFACE);
        self.store.unload();

        for section in &radios {
            if let Err(e) = self.refresh_radio(section, publish_config) {
                warn!("{}: radio refresh failed: {}", section.name, e);
            }
        }
        for section in &vifs {
            if let Err(e) = self.refresh_vif(section, publish_config) {
                warn!("{}: vif refresh failed: {}", section.name, e);
            }
        }
        debug!(
            "pass complete: {} radios, {} vifs",
            radios.len(),
            vifs.len()
        );
        Ok(())
    }

    fn refresh_radio(&mut self, section: &SectionSnapshot, publish_config: bool) -> Result<()> {
        let phy_name = self.ifmap.to_device(&section.name);
        let phy = self.registry.find_phy(phy_name).ok_or_else(|| {
            crate::error::AgentError::NotFound(format!("{} has no phy", section.name))
        })?;
        let state = radio::build_radio_state(section, phy);
        if publish_config {
            let mut conf = state.clone();
            conf.hw_type = Presence::Set(self.cfg.hw_type.clone());
            info!("{}: updating radio config", section.name);
            self.publisher.radio_config(&conf);
        }
        info!("{}: updating radio state", section.name);
        self.publisher.radio_state(&state);
        Ok(())
    }

    fn refresh_vif(&mut self, section: &SectionSnapshot, publish_config: bool) -> Result<()> {
        let device_name = vif::VifSection::parse(section)
            .ifname
            .unwrap_or_else(|| section.name.clone());
        let state = vif::build_vif_state(section, &self.registry, &device_name);
        if publish_config {
            info!("{}: updating vif config", section.name);
            self.publisher.vif_config(&state);
        }
        info!("{}: updating vif state", section.name);
        self.publisher.vif_state(&state);
        Ok(())
    }
}
