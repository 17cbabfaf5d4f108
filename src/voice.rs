//! Minimal ElevenLabs-style client for speech synthesis.
//!
//! One call: text in, audio bytes out. The synthesized audio is handed back
//! to the caller base64-encoded; nothing is stored server-side.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::AppError;

/// All synthesized clips come back as MP3.
pub const AUDIO_MIME: &str = "audio/mpeg";

#[derive(Clone)]
pub struct VoiceClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub voice_id: String,
  pub model_id: String,
}

impl VoiceClient {
  /// Construct the client if we find ELEVEN_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("ELEVEN_API_KEY").ok()?;
    let base_url =
      std::env::var("ELEVEN_BASE_URL").unwrap_or_else(|_| "https://api.elevenlabs.io".into());
    let voice_id =
      std::env::var("ELEVEN_VOICE_ID").unwrap_or_else(|_| "21m00Tcm4TlvDq8ikWAM".into());
    let model_id =
      std::env::var("ELEVEN_MODEL_ID").unwrap_or_else(|_| "eleven_multilingual_v2".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, voice_id, model_id })
  }

  /// Synthesize `text` with the given voice (or the configured default).
  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), voice = voice_id.unwrap_or(&self.voice_id)))]
  pub async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Vec<u8>, AppError> {
    let voice = voice_id.unwrap_or(&self.voice_id);
    let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice);
    let payload = json!({
      "text": text,
      "model_id": self.model_id,
      "voice_settings": { "stability": 0.5, "similarity_boost": 0.75 },
    });

    let res = self.client.post(&url)
      .header("xi-api-key", &self.api_key)
      .header(CONTENT_TYPE, "application/json")
      .json(&payload).send().await
      .map_err(|e| AppError::Service(format!("speech request failed: {e}")))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_voice_error(&body).unwrap_or(body);
      return Err(AppError::Service(format!("voice service HTTP {status}: {msg}")));
    }

    let bytes = res.bytes().await
      .map_err(|e| AppError::Service(format!("failed reading audio response: {e}")))?;
    Ok(bytes.to_vec())
  }
}

/// Try to extract a clean message from an ElevenLabs-style error body.
fn extract_voice_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { detail: serde_json::Value }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => match w.detail {
      serde_json::Value::String(s) => Some(s),
      other => other.get("message").and_then(|m| m.as_str()).map(str::to_string),
    },
    Err(_) => None,
  }
}
