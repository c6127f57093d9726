//! Study Companion · Backend
//!
//! - Axum HTTP + WebSocket API
//! - Quiz, tutor and demo summary content from a canned generator, or from
//!   OpenAI when configured (canned content stays the fallback)
//! - Summaries and sign-in forwarded to the remote study API
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   STUDY_API_BASE_URL : remote API (default "http://localhost:4000")
//!   STUDY_CONFIG_PATH  : path to TOML config (delays, prompts, timeout)
//!   STUDY_SESSION_FILE : where the signed-in session is persisted
//!   STATIC_DIR         : frontend build (default "./static")
//!   OPENAI_API_KEY     : enables OpenAI integration if present
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL       : default "gpt-4o-mini"
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use study_companion::config::AppConfig;
use study_companion::routes::build_router;
use study_companion::state::{spawn_session_sweeper, AppState};
use study_companion::telemetry;

const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(60);

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::from_env();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

  // Shared state: quiz/tutor stores, auth session, remote API client, generators.
  let state = Arc::new(AppState::new(config).await?);
  let sweeper = spawn_session_sweeper(&state, SESSION_SWEEP_EVERY);

  // Routes, CORS and tracing layers.
  let app = build_router(state.clone());

  let listener = TcpListener::bind(addr).await?;
  info!(target: "study_companion", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  sweeper.abort();
  info!(target: "study_companion", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "study_companion", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "study_companion", "Shutdown requested");
}
