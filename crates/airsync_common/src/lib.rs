//! Shared northbound vocabulary for the AirSync agent.
//!
//! Holds the record types the agent publishes upstream: presence-flagged
//! radio/VIF state records, per-request stats records (clients, survey,
//! neighbors, temperature, chain mask) and the small value types they are
//! built from (MAC addresses, radio/scan type tags).

pub mod mac;
pub mod presence;
pub mod records;
pub mod security;
pub mod state;

pub use mac::MacAddr;
pub use presence::Presence;
pub use records::{
    ChainmaskRecord, ClientRecord, NeighborRecord, RadioType, ScanType, StatsReport, SurveyRecord,
    TempRecord,
};
pub use state::{RadioConfigChanged, RadioState, VifConfigChanged, VifState};
