//! AirSync agent daemon.
//!
//! Keeps the northbound configuration/state store consistent with the
//! actual state of the Wi-Fi hardware on an access point. Hardware state
//! is reached through two channels only: the persistent UCI-style config
//! store and the nl80211 netlink protocol.

pub mod agent;
pub mod config;
pub mod error;
pub mod ifmap;
pub mod modemap;
pub mod nl80211;
pub mod publish;
pub mod radio;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod vif;

pub use agent::Agent;
pub use error::{AgentError, Result};
