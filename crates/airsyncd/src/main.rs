//! AirSync agent daemon.
//!
//! Publishes radio/VIF state northbound and reconciles the persistent
//! wireless config with the hardware on a fixed cadence.

use airsyncd::agent::{Agent, ShellApplier};
use airsyncd::config::{AgentConfig, CONFIG_PATH};
use airsyncd::nl80211::Nl80211Client;
use airsyncd::publish::LogPublisher;
use airsyncd::scheduler::Reconciler;
use airsyncd::store::UciFileStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("airsyncd v{} starting", env!("CARGO_PKG_VERSION"));

    let cfg = AgentConfig::load(CONFIG_PATH)?;

    let store = UciFileStore::new(&cfg.store_path);
    let backend = Nl80211Client::connect(Duration::from_millis(cfg.netlink_timeout_ms))?;
    let applier = ShellApplier::new(&cfg.apply_command);

    let tick_secs = cfg.tick_secs;
    let reload_divisor = cfg.reload_divisor;

    let mut agent = Agent::new(
        cfg,
        Box::new(store),
        Box::new(backend),
        Box::new(LogPublisher),
        Box::new(applier),
    );
    agent.init()?;
    agent.publish_initial()?;

    let agent = Arc::new(Mutex::new(agent));
    tokio::spawn(Reconciler::new(Arc::clone(&agent), tick_secs, reload_divisor).run());

    info!("airsyncd ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down gracefully");

    Ok(())
}
