//! Worker runtime: HTTP delivery endpoint + background message dispatch.
//!
//! The hosting context for the background listener: initializes the provider
//! app, registers the single diagnostic handler, and serves the webhook the
//! provider POSTs deliveries to.

use crate::config::{self, Config};
use crate::init;
use crate::messaging::{App, BackgroundHandler, InboundMessage, Messaging};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Header the provider echoes the configured webhook secret in.
const WEBHOOK_SECRET_HEADER: &str = "X-Push-Webhook-Secret";

/// Shared state for the worker's HTTP handlers.
#[derive(Clone)]
struct WorkerState {
    config: Arc<Config>,
    messaging: Arc<Messaging>,
    /// Sender for inbound deliveries; the dispatch task receives.
    inbound_tx: mpsc::Sender<InboundMessage>,
}

/// The handler the worker registers: one diagnostic record per message,
/// payload serialized verbatim. No transformation, filtering, or ack.
pub fn diagnostic_handler() -> BackgroundHandler {
    Box::new(|msg: InboundMessage| {
        log::info!("background message: {}", msg.0);
    })
}

/// Run the worker; binds to config.worker.bind:config.worker.port.
/// When bind is not loopback, a webhook secret must be configured or startup
/// fails. Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_worker(config: Config, config_path: PathBuf) -> Result<()> {
    run_worker_with_handler(config, config_path, diagnostic_handler()).await
}

/// Same as [`run_worker`] but with a caller-supplied background handler
/// registered in place of the diagnostic one (tests record deliveries
/// through it).
pub async fn run_worker_with_handler(
    config: Config,
    config_path: PathBuf,
    handler: BackgroundHandler,
) -> Result<()> {
    init::require_initialized(&config_path)?;
    let bind = config.worker.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) && config.worker.webhook_secret.is_none() {
        anyhow::bail!(
            "refusing to bind worker to {} without a webhook secret (set worker.webhookSecret)",
            bind
        );
    }

    let mut app_config = config.app.clone();
    app_config.api_key = config::resolve_api_key(&config);
    let app = Arc::new(App::initialize(&app_config).context("initializing provider app")?);
    let messaging = app.messaging();

    messaging
        .on_background_message(handler)
        .context("registering background message handler")?;
    log::info!("background message handler registered");

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundMessage>(64);
    let dispatch_messaging = messaging.clone();
    let dispatch = tokio::spawn(async move {
        while let Some(msg) = inbound_rx.recv().await {
            dispatch_messaging.deliver(msg);
        }
        log::debug!("dispatch task finished");
    });

    let webhook_url = config.worker.webhook_url.clone();
    if let Some(ref url) = webhook_url {
        let secret = config.worker.webhook_secret.as_deref();
        if let Err(e) = app.register_endpoint(url, secret).await {
            log::warn!("provider endpoint registration failed: {}", e);
        } else {
            log::info!("delivery endpoint registered with provider: {}", url);
        }
    }

    let state = WorkerState {
        config: Arc::new(config.clone()),
        messaging,
        inbound_tx,
    };

    let router = Router::new()
        .route("/", get(health_http))
        .route("/push/webhook", post(push_webhook))
        .with_state(state);

    let bind_addr = format!("{}:{}", bind, config.worker.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("worker listening on {}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(app, webhook_url))
        .await
        .context("worker server exited")?;

    let _ = dispatch.await;
    log::info!("worker stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// Unregisters the provider delivery endpoint if one was registered.
async fn shutdown_signal(app: Arc<App>, webhook_url: Option<String>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");

    if let Some(url) = webhook_url {
        if let Err(e) = app.unregister_endpoint(&url).await {
            log::debug!("provider endpoint unregister on shutdown: {}", e);
        }
    }
}

/// POST /push/webhook — receives a provider delivery JSON; verifies the
/// optional secret, forwards the payload untouched to the dispatch task.
async fn push_webhook(
    State(state): State<WorkerState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(ref expected) = state.config.worker.webhook_secret {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != expected.as_str() {
            return StatusCode::FORBIDDEN;
        }
    }
    let msg: InboundMessage = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(_) => return StatusCode::BAD_REQUEST,
    };
    if let Some(id) = msg.message_id() {
        log::debug!("delivery received: {}", id);
    }
    if state.inbound_tx.send(msg).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<WorkerState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.worker.port,
        "subscribed": state.messaging.has_handler(),
    }))
}
