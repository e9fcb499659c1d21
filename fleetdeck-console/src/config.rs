use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeckConfig {
    pub api: ApiConf,
    pub cadence: Option<CadenceConf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConf {
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CadenceConf {
    pub status_secs: Option<u64>,
    pub console_secs: Option<u64>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            api: ApiConf { base_url: "http://127.0.0.1:5000".into() },
            cadence: None,
        }
    }
}

impl DeckConfig {
    pub fn status_interval(&self) -> Duration {
        let secs = self
            .cadence
            .as_ref()
            .and_then(|c| c.status_secs)
            .unwrap_or(5);
        Duration::from_secs(secs)
    }

    pub fn console_interval(&self) -> Duration {
        let secs = self
            .cadence
            .as_ref()
            .and_then(|c| c.console_secs)
            .unwrap_or(1);
        Duration::from_secs(secs)
    }
}

pub async fn load_config() -> DeckConfig {
    let path = std::env::var("FLEETDECK_CONFIG").unwrap_or_else(|_| "fleetdeck.yaml".into());
    load_config_from(&path).await
}

pub async fn load_config_from(path: &str) -> DeckConfig {
    if !Path::new(path).exists() {
        warn!("no {path}, using default config");
        return DeckConfig::default();
    }
    let txt = fs::read_to_string(path).await.unwrap_or_default();
    if txt.trim().is_empty() {
        return DeckConfig::default();
    }
    serde_yaml::from_str(&txt).unwrap_or_else(|e| {
        warn!("invalid config {path}: {e}, using defaults");
        DeckConfig::default()
    })
}
