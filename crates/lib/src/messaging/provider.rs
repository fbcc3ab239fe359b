//! Push provider application context (the external SDK surface).
//!
//! `App::initialize` stands in for the provider's `initializeApp(config)`.
//! Identifiers are passed through unmodified; the only failure path is the
//! provider's own config check (project, app, and sender ids must be
//! present). Delivery-endpoint registration mirrors the provider's webhook
//! management API.

use crate::config::AppConfig;
use crate::messaging::client::Messaging;
use std::sync::Arc;

const PUSH_API_BASE: &str = "https://api.pushrelay.io";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider config rejected: {0}")]
    Config(String),
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider api error: {0}")]
    Api(String),
}

/// Initialized provider application context. Replaces the SDK's process-wide
/// singleton: constructed once at worker startup and passed to whatever
/// needs it, with its lifecycle tied to the worker context.
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    base_url: String,
    client: reqwest::Client,
    messaging: Arc<Messaging>,
}

impl App {
    /// Initialize the provider application. A failure here is fatal to
    /// registration — no handler will ever be invoked.
    pub fn initialize(config: &AppConfig) -> Result<Self, ProviderError> {
        for (field, value) in [
            ("projectId", &config.project_id),
            ("appId", &config.app_id),
            ("messagingSenderId", &config.messaging_sender_id),
        ] {
            if value.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(ProviderError::Config(format!("missing {}", field)));
            }
        }
        Ok(Self {
            config: config.clone(),
            base_url: push_api_base(),
            client: reqwest::Client::new(),
            messaging: Arc::new(Messaging::new()),
        })
    }

    /// Messaging client bound to this app: every call hands out the same
    /// client, so one handler registration covers the app's lifetime.
    pub fn messaging(&self) -> Arc<Messaging> {
        Arc::clone(&self.messaging)
    }

    pub fn project_id(&self) -> &str {
        self.config.project_id.as_deref().unwrap_or("").trim()
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        {
            Some(key) => req.header("X-Api-Key", key),
            None => req,
        }
    }

    /// Register the worker's delivery URL with the provider. When set, the
    /// provider POSTs background deliveries to the URL.
    pub async fn register_endpoint(&self, url: &str, secret: Option<&str>) -> Result<(), ProviderError> {
        let api_url = format!("{}/v1/projects/{}/endpoints", self.base_url, self.project_id());
        let mut body = serde_json::json!({
            "url": url,
            "appId": self.config.app_id,
            "senderId": self.config.messaging_sender_id,
        });
        if let Some(s) = secret {
            body["secret"] = serde_json::Value::String(s.to_string());
        }
        let res = self.authorized(self.client.post(&api_url).json(&body)).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "register endpoint failed: {} {}",
                status, body
            )));
        }
        Ok(())
    }

    /// Remove the worker's delivery URL so the provider stops POSTing to it.
    pub async fn unregister_endpoint(&self, url: &str) -> Result<(), ProviderError> {
        let api_url = format!("{}/v1/projects/{}/endpoints", self.base_url, self.project_id());
        let body = serde_json::json!({ "url": url });
        let res = self
            .authorized(self.client.delete(&api_url).json(&body))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!(
                "unregister endpoint failed: {} {}",
                status, body
            )));
        }
        Ok(())
    }
}

/// Resolve provider API base URL (for tests or self-hosted relays).
pub fn push_api_base() -> String {
    std::env::var("PUSH_API_BASE").unwrap_or_else(|_| PUSH_API_BASE.to_string())
}
