/*!
Test harness for the console orchestration.

Wires a fleet view, live pacer and command dispatcher to the scripted
stub, with helpers for driving polls and asserting on observed traffic.
*/

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use fleetdeck_console::commands::{CommandDispatcher, ConfirmGate};
use fleetdeck_console::liveview::LivePacer;
use fleetdeck_console::models::ServerInfo;
use fleetdeck_console::poller;
use fleetdeck_console::state::{new_state, FleetView, SharedFleet};
use fleetdeck_console::sync::bootstrap;
use fleetdeck_console::transport::ControlApi;
use fleetdeck_console::view::ServerView;

use crate::stub::{AutoConfirm, StubControlApi};

pub struct TestHarness {
    pub stub: Arc<StubControlApi>,
    pub api: Arc<dyn ControlApi>,
    pub fleet: SharedFleet,
    pub pacer: LivePacer,
    pub dispatcher: CommandDispatcher,
    refresh_rx: mpsc::Receiver<()>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_gate(AutoConfirm(true))
    }

    pub fn with_gate(gate: impl ConfirmGate + 'static) -> Self {
        env_logger::try_init().ok();

        let stub = Arc::new(StubControlApi::new());
        let api: Arc<dyn ControlApi> = stub.clone();
        let fleet = new_state(FleetView::default());
        let pacer = LivePacer::new(api.clone(), fleet.clone());
        let (refresh_tx, refresh_rx) = poller::refresh_channel();
        let dispatcher = CommandDispatcher::new(
            api.clone(),
            fleet.clone(),
            pacer.clone(),
            refresh_tx,
            Arc::new(gate),
        );

        Self { stub, api, fleet, pacer, dispatcher, refresh_rx }
    }

    /// Load a roster into the view, the way bootstrap does at startup.
    pub fn seed(&self, roster: Vec<ServerInfo>) {
        log::info!("seeding fleet with {} servers", roster.len());
        bootstrap(&mut self.fleet.lock(), roster);
    }

    /// Run exactly one status poll (snapshot + reconcile + fan-out).
    pub async fn poll_once(&self) {
        poller::poll_once(&self.api, &self.fleet, &self.pacer).await;
    }

    /// Let spawned per-server tasks (stats, inline frames) settle.
    pub async fn settle(&self) {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    pub fn server(&self, id: &str) -> Option<ServerView> {
        self.fleet.lock().get(id).cloned()
    }

    pub fn set_inject_input(&self, id: &str, text: &str) {
        if let Some(server) = self.fleet.lock().get_mut(id) {
            server.inject_input = text.to_string();
        }
    }

    pub fn set_exec_input(&self, id: &str, command: &str) {
        if let Some(server) = self.fleet.lock().get_mut(id) {
            server.exec_input = command.to_string();
        }
    }

    /// Wait for the out-of-band refresh a lifecycle command schedules.
    pub async fn wait_for_early_refresh(&mut self, within: Duration) -> Result<()> {
        timeout(within, self.refresh_rx.recv())
            .await
            .context("no early status refresh arrived")?
            .context("refresh channel closed")?;
        Ok(())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
