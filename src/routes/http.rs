//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! pipeline; every failure is an `AppError` and renders with its own status.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::ExerciseBatch;
use crate::error::AppError;
use crate::pipeline::{generate_exercises, synthesize_speech};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(skill = body.skill_id.as_deref().unwrap_or("-")))]
pub async fn http_post_exercises(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateExercisesIn>,
) -> Result<Json<ExerciseBatch>, AppError> {
  let batch = generate_exercises(&state, &body).await?;
  info!(target: "exercise", count = batch.exercises.len(), "HTTP exercise batch served");
  Ok(Json(batch))
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.as_deref().map(str::len).unwrap_or(0)))]
pub async fn http_post_tts(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TtsIn>,
) -> Result<Json<TtsOut>, AppError> {
  let out = synthesize_speech(&state, &body).await?;
  info!(target: "brightpath_backend", audio_b64_len = out.audio_base64.len(), "HTTP speech synthesized");
  Ok(Json(out))
}
