//! BrightPath · Character Education Backend
//!
//! - Axum HTTP API for exercise generation and speech synthesis
//! - OpenAI-compatible generation service (via environment variables)
//! - Static admin console fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   OPENAI_API_KEY    : enables exercise generation if present
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL  : default "gpt-4o-mini"
//!   ELEVEN_API_KEY    : enables speech synthesis if present
//!   ELEVEN_BASE_URL    : default "https://api.elevenlabs.io"
//!   ELEVEN_VOICE_ID    : default narration voice
//!   ELEVEN_MODEL_ID    : default "eleven_multilingual_v2"
//!   CURRICULUM_CONFIG_PATH  : path to TOML curriculum (skills/levels/types/prompts)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod catalog;
mod config;
mod prompt;
mod llm;
mod voice;
mod pipeline;
mod protocol;
mod state;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (curriculum, prompts, service clients).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "brightpath_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
