use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use fleetdeck_console::commands::CommandDispatcher;
use fleetdeck_console::config;
use fleetdeck_console::console::spawn_console_poller;
use fleetdeck_console::liveview::{LivePacer, Surface};
use fleetdeck_console::operator;
use fleetdeck_console::poller::{refresh_channel, spawn_status_poller};
use fleetdeck_console::state::{new_state, FleetView};
use fleetdeck_console::sync::bootstrap;
use fleetdeck_console::transport::{ControlApi, HttpControlApi};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fleetdeck_console=info".to_string()),
        )
        .init();

    let cfg = config::load_config().await;
    info!("connecting to control api at {}", cfg.api.base_url);

    let api: Arc<dyn ControlApi> = Arc::new(HttpControlApi::new(&cfg.api.base_url));
    let fleet = new_state(FleetView::default());

    // roster first; without it there is nothing to observe
    let roster = api
        .fleet_config()
        .await
        .context("failed to load fleet configuration, check the backend")?;
    info!("loaded {} configured servers", roster.len());
    bootstrap(&mut fleet.lock(), roster);

    let pacer = LivePacer::new(api.clone(), fleet.clone());

    // every roster card carries an inline live view from the start
    let inline_targets: Vec<(String, String)> = fleet
        .lock()
        .servers
        .values()
        .map(|s| (s.id.clone(), s.name.clone()))
        .collect();
    for (id, name) in inline_targets {
        pacer.open(&id, &name, Surface::Inline);
    }

    let (refresh_tx, refresh_rx) = refresh_channel();
    spawn_status_poller(
        api.clone(),
        fleet.clone(),
        pacer.clone(),
        cfg.status_interval(),
        refresh_rx,
    );
    spawn_console_poller(api.clone(), fleet.clone(), cfg.console_interval());

    let dispatcher =
        CommandDispatcher::new(api, fleet.clone(), pacer, refresh_tx, operator::term_gate());

    operator::run(dispatcher, fleet).await;
    Ok(())
}
