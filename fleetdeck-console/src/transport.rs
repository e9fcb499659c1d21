//! Control-API transport adapter.
//!
//! One request/response exchange per call, no retry and no timeout; pacing
//! and retry policy live in the callers. Cancellation upstream is "ignore
//! the result" - an in-flight request is never aborted here.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::models::{ConsolePayload, ExecPayload, ServerInfo, ServerState, StatsPayload};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("control api returned {status} for {operation}")]
    Status { operation: String, status: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

impl LifecycleAction {
    pub fn verb(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Restart => "restart",
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

/// The control-plane operations the console consumes. Implemented by
/// [`HttpControlApi`] for real backends and by the devkit stub in tests.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// GET /api/config - the configured fleet roster.
    async fn fleet_config(&self) -> Result<Vec<ServerInfo>, TransportError>;

    /// GET /api/servers - one full status snapshot.
    async fn fleet_snapshot(&self) -> Result<Vec<ServerState>, TransportError>;

    /// GET /api/server/{id}/stats - utilization percentages.
    async fn stats(&self, id: &str) -> Result<StatsPayload, TransportError>;

    /// GET /api/server/{name}/screenshot?t={token} - current frame bytes.
    /// The token defeats intermediary caching; it carries no meaning.
    async fn screenshot(&self, name: &str, token: i64) -> Result<Vec<u8>, TransportError>;

    /// GET /api/server/{id}/console/output - console output since last poll.
    async fn console_output(&self, id: &str) -> Result<Option<String>, TransportError>;

    /// POST /api/server/{name}/{start|stop|restart} - ack ignored.
    async fn lifecycle(&self, name: &str, action: LifecycleAction) -> Result<(), TransportError>;

    /// POST /api/server/{name}/type - keystroke injection, ack ignored.
    async fn inject_text(&self, name: &str, text: &str) -> Result<(), TransportError>;

    /// POST /api/server/{id}/command - one line into the persistent shell
    /// session, ack ignored.
    async fn shell_input(&self, id: &str, line: &str) -> Result<(), TransportError>;

    /// POST /api/server/{id}/ssh_exec - request/response execution.
    async fn exec(&self, id: &str, command: &str) -> Result<String, TransportError>;
}

/// reqwest-backed [`ControlApi`] against a base URL such as
/// `http://127.0.0.1:5000`.
pub struct HttpControlApi {
    http: Client,
    base: String,
}

impl HttpControlApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let resp = self.http.get(self.url(path)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                operation: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn post_ack(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), TransportError> {
        let mut req = self.http.post(self.url(path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                operation: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ControlApi for HttpControlApi {
    async fn fleet_config(&self) -> Result<Vec<ServerInfo>, TransportError> {
        self.get_json("/api/config").await
    }

    async fn fleet_snapshot(&self) -> Result<Vec<ServerState>, TransportError> {
        self.get_json("/api/servers").await
    }

    async fn stats(&self, id: &str) -> Result<StatsPayload, TransportError> {
        self.get_json(&format!("/api/server/{id}/stats")).await
    }

    async fn screenshot(&self, name: &str, token: i64) -> Result<Vec<u8>, TransportError> {
        let path = format!("/api/server/{name}/screenshot");
        let resp = self
            .http
            .get(self.url(&path))
            .query(&[("t", token)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status { operation: path, status: status.as_u16() });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn console_output(&self, id: &str) -> Result<Option<String>, TransportError> {
        let payload: ConsolePayload =
            self.get_json(&format!("/api/server/{id}/console/output")).await?;
        Ok(payload.output)
    }

    async fn lifecycle(&self, name: &str, action: LifecycleAction) -> Result<(), TransportError> {
        self.post_ack(&format!("/api/server/{name}/{}", action.verb()), None).await
    }

    async fn inject_text(&self, name: &str, text: &str) -> Result<(), TransportError> {
        self.post_ack(&format!("/api/server/{name}/type"), Some(json!({ "text": text }))).await
    }

    async fn shell_input(&self, id: &str, line: &str) -> Result<(), TransportError> {
        self.post_ack(&format!("/api/server/{id}/command"), Some(json!({ "command": line })))
            .await
    }

    async fn exec(&self, id: &str, command: &str) -> Result<String, TransportError> {
        let path = format!("/api/server/{id}/ssh_exec");
        let resp = self
            .http
            .post(self.url(&path))
            .json(&json!({ "command": command }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status { operation: path, status: status.as_u16() });
        }
        let payload: ExecPayload = resp.json().await?;
        Ok(payload.output.unwrap_or_default())
    }
}
