/*!
Scripted control-API stub for development without a backend.

Records every call it receives and answers from scripted state, so tests
can both steer the console's loops and assert on the traffic they produce.
*/

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use fleetdeck_console::commands::ConfirmGate;
use fleetdeck_console::models::{ServerInfo, ServerState, StatsPayload};
use fleetdeck_console::transport::{ControlApi, LifecycleAction, TransportError};

/// One observed control-API call, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    FleetConfig,
    FleetSnapshot,
    Stats(String),
    Screenshot { name: String, token: i64 },
    ConsoleOutput(String),
    Lifecycle { name: String, action: LifecycleAction },
    Inject { name: String, text: String },
    ShellInput { id: String, line: String },
    Exec { id: String, command: String },
}

#[derive(Default)]
pub struct StubControlApi {
    calls: Mutex<Vec<RecordedCall>>,
    roster: Mutex<Vec<ServerInfo>>,
    snapshot: Mutex<Vec<ServerState>>,
    stats: Mutex<HashMap<String, StatsPayload>>,
    console: Mutex<HashMap<String, VecDeque<String>>>,
    exec_output: Mutex<HashMap<String, String>>,
    frame: Mutex<Vec<u8>>,
    fail_snapshots: AtomicBool,
    fail_screenshots: AtomicBool,
    fail_commands: AtomicBool,
}

impl StubControlApi {
    pub fn new() -> Self {
        let stub = Self::default();
        *stub.frame.lock().unwrap() = vec![0x89, 0x50, 0x4e, 0x47];
        stub
    }

    // ----- scripting -----

    pub fn set_roster(&self, roster: Vec<ServerInfo>) {
        *self.roster.lock().unwrap() = roster;
    }

    /// The snapshot every poll will see until replaced.
    pub fn set_snapshot(&self, snapshot: Vec<ServerState>) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn set_stats(&self, id: &str, payload: StatsPayload) {
        self.stats.lock().unwrap().insert(id.to_string(), payload);
    }

    /// Queue one console chunk; each fetch for `id` drains one chunk.
    pub fn push_console(&self, id: &str, chunk: &str) {
        self.console
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(chunk.to_string());
    }

    pub fn set_exec_output(&self, id: &str, output: &str) {
        self.exec_output.lock().unwrap().insert(id.to_string(), output.to_string());
    }

    pub fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    pub fn fail_screenshots(&self, fail: bool) {
        self.fail_screenshots.store(fail, Ordering::SeqCst);
    }

    /// Make lifecycle/inject/shell/exec requests fail.
    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    // ----- assertions -----

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&RecordedCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(*c)).count()
    }

    pub fn screenshot_count(&self, name: &str) -> usize {
        self.count_calls(|c| matches!(c, RecordedCall::Screenshot { name: n, .. } if n == name))
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: RecordedCall) {
        log::debug!("[STUB] {call:?}");
        self.calls.lock().unwrap().push(call);
    }

    fn failure(&self, operation: &str) -> TransportError {
        TransportError::Status { operation: operation.to_string(), status: 503 }
    }
}

#[async_trait]
impl ControlApi for StubControlApi {
    async fn fleet_config(&self) -> Result<Vec<ServerInfo>, TransportError> {
        self.record(RecordedCall::FleetConfig);
        Ok(self.roster.lock().unwrap().clone())
    }

    async fn fleet_snapshot(&self) -> Result<Vec<ServerState>, TransportError> {
        self.record(RecordedCall::FleetSnapshot);
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(self.failure("servers"));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn stats(&self, id: &str) -> Result<StatsPayload, TransportError> {
        self.record(RecordedCall::Stats(id.to_string()));
        Ok(self
            .stats
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn screenshot(&self, name: &str, token: i64) -> Result<Vec<u8>, TransportError> {
        self.record(RecordedCall::Screenshot { name: name.to_string(), token });
        if self.fail_screenshots.load(Ordering::SeqCst) {
            return Err(self.failure("screenshot"));
        }
        Ok(self.frame.lock().unwrap().clone())
    }

    async fn console_output(&self, id: &str) -> Result<Option<String>, TransportError> {
        self.record(RecordedCall::ConsoleOutput(id.to_string()));
        Ok(self.console.lock().unwrap().get_mut(id).and_then(|q| q.pop_front()))
    }

    async fn lifecycle(&self, name: &str, action: LifecycleAction) -> Result<(), TransportError> {
        self.record(RecordedCall::Lifecycle { name: name.to_string(), action });
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(self.failure("lifecycle"));
        }
        Ok(())
    }

    async fn inject_text(&self, name: &str, text: &str) -> Result<(), TransportError> {
        self.record(RecordedCall::Inject { name: name.to_string(), text: text.to_string() });
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(self.failure("type"));
        }
        Ok(())
    }

    async fn shell_input(&self, id: &str, line: &str) -> Result<(), TransportError> {
        self.record(RecordedCall::ShellInput { id: id.to_string(), line: line.to_string() });
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(self.failure("command"));
        }
        Ok(())
    }

    async fn exec(&self, id: &str, command: &str) -> Result<String, TransportError> {
        self.record(RecordedCall::Exec { id: id.to_string(), command: command.to_string() });
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(self.failure("ssh_exec"));
        }
        Ok(self
            .exec_output
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Scripted restart gate: `AutoConfirm(true)` approves everything,
/// `AutoConfirm(false)` declines everything.
pub struct AutoConfirm(pub bool);

impl ConfirmGate for AutoConfirm {
    fn confirm(&self, _action: LifecycleAction, _name: &str) -> bool {
        self.0
    }
}
