//! Per-server view-model records.
//!
//! These records are the rendering contract: a display surface draws them as
//! a pure projection and never mutates them. Writers are fixed per field
//! family (see `state`): the synchronizer owns status/gating/zeroing, the
//! stats fetcher owns the gauges, the pacer owns the frames, the console
//! poller owns the console buffer and the dispatcher owns inputs and the
//! exec panel.

use serde::Serialize;

use crate::models::{ServerInfo, ServerStatus};

/// Mutually exclusive enablement of the lifecycle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlGating {
    pub start: bool,
    pub restart: bool,
    pub stop: bool,
}

impl ControlGating {
    pub fn for_status(status: ServerStatus) -> Self {
        if status.is_running() {
            Self { start: false, restart: true, stop: true }
        } else {
            Self { start: true, restart: false, stop: false }
        }
    }
}

/// One numeric utilization readout, projected as "12.3%".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Gauge(pub f32);

impl Gauge {
    pub fn set(&mut self, value: f32) {
        self.0 = value;
    }

    pub fn text(&self) -> String {
        format!("{:.1}%", self.0)
    }
}

/// Last successfully loaded frame for one surface, with the cache-bust
/// token it was fetched under.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    pub image: Option<Vec<u8>>,
    pub token: Option<i64>,
}

impl FrameSlot {
    pub fn swap(&mut self, image: Vec<u8>, token: i64) {
        self.image = Some(image);
        self.token = Some(token);
    }
}

/// Append-only console text. The revision counter only ever increases and
/// is the scroll-to-end signal for a display surface.
#[derive(Debug, Clone, Default)]
pub struct ConsoleBuffer {
    pub text: String,
    pub revision: u64,
}

impl ConsoleBuffer {
    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.revision += 1;
    }
}

/// State of the remote-exec output panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExecPanel {
    #[default]
    Hidden,
    Executing,
    Output(String),
    Failed(String),
}

impl ExecPanel {
    /// Visible text of the panel, or None while hidden.
    pub fn text(&self) -> Option<&str> {
        match self {
            ExecPanel::Hidden => None,
            ExecPanel::Executing => Some("executing..."),
            ExecPanel::Output(out) => Some(out),
            ExecPanel::Failed(msg) => Some(msg),
        }
    }
}

/// Everything a display surface needs for one managed server.
#[derive(Debug, Clone)]
pub struct ServerView {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub ip: String,
    pub status: ServerStatus,
    pub controls: ControlGating,
    pub cpu: Gauge,
    pub ram: Gauge,
    pub disk: Gauge,
    pub inline_frame: FrameSlot,
    pub expanded_frame: FrameSlot,
    pub console: ConsoleBuffer,
    pub inject_input: String,
    pub exec_input: String,
    pub exec_panel: ExecPanel,
}

impl ServerView {
    pub fn new(info: ServerInfo) -> Self {
        let status = ServerStatus::Unknown;
        Self {
            id: info.id,
            name: info.name,
            display_name: info.display_name,
            ip: info.ip,
            status,
            controls: ControlGating::for_status(status),
            cpu: Gauge::default(),
            ram: Gauge::default(),
            disk: Gauge::default(),
            inline_frame: FrameSlot::default(),
            expanded_frame: FrameSlot::default(),
            console: ConsoleBuffer::default(),
            inject_input: String::new(),
            exec_input: String::new(),
            exec_panel: ExecPanel::default(),
        }
    }

    /// Badge projection, e.g. ("running", "status-running").
    pub fn badge(&self) -> (&'static str, String) {
        let label = self.status.label();
        (label, format!("status-{label}"))
    }

    pub fn zero_gauges(&mut self) {
        self.cpu.set(0.0);
        self.ram.set(0.0);
        self.disk.set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str) -> ServerInfo {
        ServerInfo {
            id: id.into(),
            name: format!("srv-{id}"),
            display_name: format!("Server {id}"),
            ip: "10.0.0.1".into(),
        }
    }

    #[test]
    fn new_view_starts_unknown_with_start_enabled() {
        let view = ServerView::new(info("1"));
        assert_eq!(view.status, ServerStatus::Unknown);
        assert!(view.controls.start);
        assert!(!view.controls.restart);
        assert!(!view.controls.stop);
        assert_eq!(view.badge(), ("unknown", "status-unknown".into()));
    }

    #[test]
    fn gauge_projects_one_decimal_percent() {
        let mut g = Gauge::default();
        assert_eq!(g.text(), "0.0%");
        g.set(42.25);
        assert_eq!(g.text(), "42.2%");
    }

    #[test]
    fn console_buffer_appends_and_bumps_revision() {
        let mut buf = ConsoleBuffer::default();
        buf.append("$ uptime\n");
        buf.append("5 days\n");
        assert_eq!(buf.text, "$ uptime\n5 days\n");
        assert_eq!(buf.revision, 2);
    }

    #[test]
    fn exec_panel_projects_visible_text() {
        assert_eq!(ExecPanel::Hidden.text(), None);
        assert_eq!(ExecPanel::Executing.text(), Some("executing..."));
        assert_eq!(ExecPanel::Output("5 days".into()).text(), Some("5 days"));
    }
}
