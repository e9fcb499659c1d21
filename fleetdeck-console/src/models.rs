use serde::{Deserialize, Serialize};

/// Lifecycle status as reported by the control API. Strings this client
/// does not know decode as `Unknown` rather than failing the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ServerStatus {
    #[default]
    Unknown,
    Running,
    Stopped,
}

impl From<String> for ServerStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => ServerStatus::Running,
            "stopped" => ServerStatus::Stopped,
            _ => ServerStatus::Unknown,
        }
    }
}

impl ServerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ServerStatus::Unknown => "unknown",
            ServerStatus::Running => "running",
            ServerStatus::Stopped => "stopped",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ServerStatus::Running)
    }
}

/// Roster row from GET /api/config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub ip: String,
}

/// Snapshot row from GET /api/servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerState {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub ip: String,
    pub status: ServerStatus,
}

/// Utilization payload from GET /api/server/{id}/stats. The backend either
/// returns the three percentages or an `error` marker, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsPayload {
    #[serde(default)]
    pub cpu: Option<f32>,
    #[serde(default)]
    pub ram: Option<f32>,
    #[serde(default)]
    pub disk: Option<f32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatsPayload {
    /// A usable reading: no error marker and all three values present.
    pub fn reading(&self) -> Option<(f32, f32, f32)> {
        if self.error.is_some() {
            return None;
        }
        Some((self.cpu?, self.ram?, self.disk?))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsolePayload {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecPayload {
    #[serde(default)]
    pub output: Option<String>,
}
