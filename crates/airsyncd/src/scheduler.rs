//! Reconciliation scheduler.
//!
//! A fixed 1 Hz heartbeat drives the agent, but a full reconciliation
//! pass only runs every `reload_divisor` ticks, or immediately on the
//! next tick after a config-set left a reload pending. Ticks that fall
//! behind are coalesced rather than replayed in a burst.

use crate::agent::Agent;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

pub struct Reconciler {
    agent: Arc<Mutex<Agent>>,
    tick: Duration,
    reload_divisor: u32,
}

impl Reconciler {
    pub fn new(agent: Arc<Mutex<Agent>>, tick_secs: u64, reload_divisor: u32) -> Self {
        Self {
            agent,
            tick: Duration::from_secs(tick_secs.max(1)),
            reload_divisor: reload_divisor.max(1),
        }
    }

    /// Runs the tick loop until the task is dropped.
    pub async fn run(self) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut counter: u32 = 0;
        loop {
            ticker.tick().await;
            if let Err(e) = self.on_tick(counter).await {
                warn!("reconciliation pass failed: {}", e);
            }
            counter = counter.wrapping_add(1);
        }
    }

    async fn on_tick(&self, counter: u32) -> Result<()> {
        let mut agent = self.agent.lock().await;
        if counter % self.reload_divisor == 0 || agent.reload_pending() {
            debug!("tick {}: running pass", counter);
            agent.run_pass()
        } else {
            Ok(())
        }
    }
}
