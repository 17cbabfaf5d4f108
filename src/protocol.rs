//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

/// Inbound generation request. Fields are optional so the pipeline can
/// answer missing input with a descriptive message instead of a generic
/// deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct GenerateExercisesIn {
    #[serde(rename = "skillId")]
    pub skill_id: Option<String>,
    #[serde(rename = "crownLevel")]
    pub crown_level: Option<i64>,
    #[serde(rename = "exerciseCount", default)]
    pub exercise_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TtsIn {
    pub text: Option<String>,
    #[serde(rename = "voiceId", default)]
    pub voice_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TtsOut {
    #[serde(rename = "audioBase64")]
    pub audio_base64: String,
    pub mime: String,
}

/// Uniform failure body; the HTTP status carries the error kind.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
