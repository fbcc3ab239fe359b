//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.hark/config.json`) and environment.
//! Provider identifiers are opaque pass-through values; nothing here validates
//! or derives them — they go to the provider exactly as written.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Worker server settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Push provider application identifiers.
    #[serde(default)]
    pub app: AppConfig,
}

/// Worker bind, port, and delivery-webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    /// Port for the HTTP delivery endpoint (default 15353).
    #[serde(default = "default_worker_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_worker_bind")]
    pub bind: String,

    /// Public URL the provider POSTs deliveries to. When set, the worker
    /// registers it with the provider at startup and removes it on shutdown.
    pub webhook_url: Option<String>,

    /// Shared secret the provider echoes back in X-Push-Webhook-Secret.
    /// Required when bind is not loopback.
    pub webhook_secret: Option<String>,
}

/// Push provider application identifiers. Opaque pass-through values; the
/// provider interprets them, this code never does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Provider API key. Often blank in checked-in config; HARK_API_KEY env
    /// overrides it at deploy time.
    pub api_key: Option<String>,
    pub app_id: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub project_id: Option<String>,
    pub auth_domain: Option<String>,
    pub storage_bucket: Option<String>,
    pub measurement_id: Option<String>,
}

fn default_worker_port() -> u16 {
    15353
}

fn default_worker_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            port: default_worker_port(),
            bind: default_worker_bind(),
            webhook_url: None,
            webhook_secret: None,
        }
    }
}

/// Resolve the provider API key: env HARK_API_KEY overrides config.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    std::env::var("HARK_API_KEY")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .app
                .api_key
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("HARK_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".hark").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or HARK_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the config directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
