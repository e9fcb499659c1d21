//! Operator command dispatch.
//!
//! Lifecycle and keystroke injection are fire-and-forget: the
//! acknowledgment is ignored and the real outcome is observed through
//! later polling. Remote exec is request/response and renders its output
//! into the exec panel. Every failure is caught and logged here; nothing
//! thrown by a command may reach a polling loop.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::liveview::{LivePacer, Surface};
use crate::poller::RefreshSender;
use crate::state::SharedFleet;
use crate::transport::{ControlApi, LifecycleAction};
use crate::view::ExecPanel;

const LIFECYCLE_REFRESH_DELAY: Duration = Duration::from_secs(1);
const INJECT_REFRESH_DELAYS: [Duration; 2] =
    [Duration::from_millis(500), Duration::from_millis(1500)];

/// Blocking destructive-action gate. Consulted before a restart is sent;
/// the terminal surface prompts the operator, tests script the answer.
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, action: LifecycleAction, name: &str) -> bool;
}

#[derive(Clone)]
pub struct CommandDispatcher {
    api: Arc<dyn ControlApi>,
    fleet: SharedFleet,
    pacer: LivePacer,
    refresh_tx: RefreshSender,
    gate: Arc<dyn ConfirmGate>,
}

impl CommandDispatcher {
    pub fn new(
        api: Arc<dyn ControlApi>,
        fleet: SharedFleet,
        pacer: LivePacer,
        refresh_tx: RefreshSender,
        gate: Arc<dyn ConfirmGate>,
    ) -> Self {
        Self { api, fleet, pacer, refresh_tx, gate }
    }

    pub async fn start(&self, name: &str) {
        self.lifecycle(name, LifecycleAction::Start).await;
    }

    pub async fn stop(&self, name: &str) {
        self.lifecycle(name, LifecycleAction::Stop).await;
    }

    /// Restart goes through the confirm gate first; a declined restart
    /// sends nothing at all.
    pub async fn restart(&self, name: &str) {
        if !self.gate.confirm(LifecycleAction::Restart, name) {
            info!(server = name, "restart declined by operator");
            return;
        }
        self.lifecycle(name, LifecycleAction::Restart).await;
    }

    async fn lifecycle(&self, name: &str, action: LifecycleAction) {
        let command_id = Uuid::new_v4();
        info!(%command_id, server = name, %action, "dispatching lifecycle command");

        if let Err(e) = self.api.lifecycle(name, action).await {
            warn!(%command_id, server = name, "lifecycle command failed: {e}");
        }
        // win or lose, pull the next status early so the view catches the
        // transition without waiting out the full poll period
        self.schedule_refresh();
    }

    fn schedule_refresh(&self) {
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(LIFECYCLE_REFRESH_DELAY).await;
            let _ = tx.send(()).await;
        });
    }

    /// Inject the server's pending input text as keystrokes. The input is
    /// cleared before the send resolves (optimistic); an empty string is a
    /// valid send. The injected text is expected to change what is on
    /// screen, so two extra inline refreshes are forced shortly after.
    pub async fn inject(&self, id: &str, name: &str) {
        let Some(text) = self
            .fleet
            .lock()
            .get_mut(id)
            .map(|server| std::mem::take(&mut server.inject_input))
        else {
            return;
        };

        let command_id = Uuid::new_v4();
        info!(%command_id, server = name, chars = text.len(), "injecting keystrokes");

        if let Err(e) = self.api.inject_text(name, &text).await {
            warn!(%command_id, server = name, "keystroke injection failed: {e}");
        }

        for delay in INJECT_REFRESH_DELAYS {
            let pacer = self.pacer.clone();
            let (id, name) = (id.to_string(), name.to_string());
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                pacer.refresh_inline(&id, &name);
            });
        }
    }

    /// Feed one line to the server's persistent shell session.
    /// Fire-and-forget; the result shows up in the console stream.
    pub async fn shell_input(&self, id: &str, line: &str) {
        let command_id = Uuid::new_v4();
        info!(%command_id, id, "sending shell input");
        if let Err(e) = self.api.shell_input(id, line).await {
            warn!(%command_id, id, "shell input failed: {e}");
        }
    }

    /// Execute the server's pending exec text remotely and render the
    /// captured output. Empty text is rejected before any request is
    /// issued; the input is left intact for editing either way.
    pub async fn exec(&self, id: &str) {
        let Some(command) = self.fleet.lock().get(id).map(|s| s.exec_input.clone()) else {
            return;
        };
        if command.is_empty() {
            return;
        }

        let command_id = Uuid::new_v4();
        info!(%command_id, id, "executing remote command");

        if let Some(server) = self.fleet.lock().get_mut(id) {
            server.exec_panel = ExecPanel::Executing;
        }

        let panel = match self.api.exec(id, &command).await {
            Ok(output) if output.is_empty() => ExecPanel::Output("[no output]".into()),
            Ok(output) => ExecPanel::Output(output),
            Err(e) => {
                warn!(%command_id, id, "remote command failed: {e}");
                ExecPanel::Failed("error executing command".into())
            }
        };

        if let Some(server) = self.fleet.lock().get_mut(id) {
            server.exec_panel = panel;
        }
    }

    /// Open the expanded view for a server; any prior expanded session for
    /// it is cancelled by the pacer.
    pub fn open_expanded(&self, id: &str, name: &str) {
        self.pacer.open(id, name, Surface::Expanded);
    }

    /// The escape gesture: close the expanded view, if one is showing.
    pub fn close_expanded(&self) {
        let overlay = self.fleet.lock().expanded.clone();
        if let Some(overlay) = overlay {
            self.pacer.close(&overlay.id, Surface::Expanded);
        }
    }
}
