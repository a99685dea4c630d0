//! Northbound publishing boundary.
//!
//! The schema sink receives presence-flagged records; the transport that
//! carries them upstream lives outside the agent.

use airsync_common::{RadioState, VifState};
use tracing::info;

/// Receives normalized records as reconciliation produces them.
pub trait StatePublisher: Send {
    fn radio_state(&mut self, state: &RadioState);
    fn radio_config(&mut self, conf: &RadioState);
    fn vif_state(&mut self, state: &VifState);
    fn vif_config(&mut self, conf: &VifState);
}

// Lets a caller keep a handle on the publisher it hands the agent.
impl<P: StatePublisher> StatePublisher for std::sync::Arc<std::sync::Mutex<P>> {
    fn radio_state(&mut self, state: &RadioState) {
        if let Ok(mut p) = self.lock() {
            p.radio_state(state);
        }
    }

    fn radio_config(&mut self, conf: &RadioState) {
        if let Ok(mut p) = self.lock() {
            p.radio_config(conf);
        }
    }

    fn vif_state(&mut self, state: &VifState) {
        if let Ok(mut p) = self.lock() {
            p.vif_state(state);
        }
    }

    fn vif_config(&mut self, conf: &VifState) {
        if let Ok(mut p) = self.lock() {
            p.vif_config(conf);
        }
    }
}

/// Logs every record as JSON. Stands in for the real northbound transport.
#[derive(Default)]
pub struct LogPublisher;

impl StatePublisher for LogPublisher {
    fn radio_state(&mut self, state: &RadioState) {
        if let Ok(json) = serde_json::to_string(state) {
            info!("radio_state {}", json);
        }
    }

    fn radio_config(&mut self, conf: &RadioState) {
        if let Ok(json) = serde_json::to_string(conf) {
            info!("radio_config {}", json);
        }
    }

    fn vif_state(&mut self, state: &VifState) {
        if let Ok(json) = serde_json::to_string(state) {
            info!("vif_state {}", json);
        }
    }

    fn vif_config(&mut self, conf: &VifState) {
        if let Ok(json) = serde_json::to_string(conf) {
            info!("vif_config {}", json);
        }
    }
}

/// Keeps everything it is handed, for assertions in tests.
#[derive(Default)]
pub struct RecordingPublisher {
    pub radio_states: Vec<RadioState>,
    pub radio_configs: Vec<RadioState>,
    pub vif_states: Vec<VifState>,
    pub vif_configs: Vec<VifState>,
}

impl RecordingPublisher {
    pub fn last_radio_state(&self, if_name: &str) -> Option<&RadioState> {
        self.radio_states.iter().rev().find(|r| r.if_name == if_name)
    }

    pub fn last_vif_state(&self, if_name: &str) -> Option<&VifState> {
        self.vif_states.iter().rev().find(|v| v.if_name == if_name)
    }
}

impl StatePublisher for RecordingPublisher {
    fn radio_state(&mut self, state: &RadioState) {
        self.radio_states.push(state.clone());
    }

    fn radio_config(&mut self, conf: &RadioState) {
        self.radio_configs.push(conf.clone());
    }

    fn vif_state(&mut self, state: &VifState) {
        self.vif_states.push(state.clone());
    }

    fn vif_config(&mut self, conf: &VifState) {
        self.vif_configs.push(conf.clone());
    }
}
