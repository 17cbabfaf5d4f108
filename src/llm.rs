//! Minimal OpenAI-compatible client for exercise generation.
//!
//! We only call chat.completions and always request a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes
//! (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::ExerciseBatch;
use crate::error::AppError;
use crate::util::trunc_for_log;

/// Fixed sampling temperature for exercise generation. High enough for
/// varied scenarios, low enough to keep the JSON contract intact.
const GENERATION_TEMPERATURE: f32 = 0.9;

/// Token ceiling sized for a full batch of 8 exercises with feedback text.
const GENERATION_MAX_TOKENS: u32 = 4096;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// JSON-object chat completion. Generic over the target type T.
  ///
  /// Upstream transport failures and non-success statuses surface as
  /// `AppError::Service`; an envelope or content that does not decode as T
  /// surfaces as `AppError::Parsing` with the raw payload logged.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
    max_tokens: u32,
  ) -> Result<T, AppError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: Some(max_tokens),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "brightpath-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| AppError::Service(format!("generation request failed: {e}")))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_provider_error(&body).unwrap_or(body);
      return Err(AppError::Service(format!("OpenAI HTTP {status}: {msg}")));
    }

    let raw = res.text().await
      .map_err(|e| AppError::Service(format!("failed reading generation response: {e}")))?;
    let body: ChatCompletionResponse = serde_json::from_str(&raw).map_err(|e| {
      error!(raw = %trunc_for_log(&raw, 400), error = %e, "Unreadable completion envelope");
      AppError::Parsing(format!("completion envelope did not parse: {e}"))
    })?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    serde_json::from_str::<T>(&text).map_err(|e| {
      error!(raw = %trunc_for_log(&text, 400), error = %e, "Completion content did not match the expected shape");
      AppError::Parsing(format!("completion content did not parse: {e}"))
    })
  }

  /// Generate one exercise batch from a pre-composed user prompt.
  #[instrument(level = "info", skip(self, prompts, user_prompt), fields(model = %self.model, prompt_len = user_prompt.len()))]
  pub async fn generate_exercise_batch(
    &self,
    prompts: &Prompts,
    user_prompt: &str,
  ) -> Result<ExerciseBatch, AppError> {
    let start = std::time::Instant::now();
    let result = self
      .chat_json::<ExerciseBatch>(
        &prompts.generation_system,
        user_prompt,
        GENERATION_TEMPERATURE,
        GENERATION_MAX_TOKENS,
      )
      .await;
    let elapsed = start.elapsed();

    match &result {
      Ok(batch) => {
        info!(target: "exercise", ?elapsed, count = batch.exercises.len(), "Exercise batch received");
      }
      Err(e) => {
        error!(target: "exercise", ?elapsed, error = %e, "Model call failed during exercise generation");
      }
    }

    result
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_provider_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
