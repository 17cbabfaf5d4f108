//! Domain models: the generated exercise and the batch returned to callers.
//!
//! Everything here is request-scoped and immutable; nothing is persisted.
//! The wire casing is camelCase (the frontend contract), bridged via serde.

use serde::{Deserialize, Serialize};

/// One generated learning activity for a skill + crown level.
///
/// `options`, when present, lists the correct answer first followed by
/// exactly 3 distractors. `image_desc` and `audio_transcript` only apply to
/// the exercise types that use them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExercise {
  #[serde(default)]
  pub exercise_id: String,
  #[serde(rename = "type")]
  pub exercise_type: String,
  pub prompt_text: String,
  #[serde(default)]
  pub image_desc: Option<String>,
  #[serde(default)]
  pub audio_transcript: Option<String>,
  #[serde(default)]
  pub options: Option<Vec<String>>,
  #[serde(default)]
  pub correct_answer: Option<String>,
  #[serde(default)]
  pub hint_text: String,
  #[serde(default)]
  pub feedback_correct: String,
  #[serde(default)]
  pub feedback_incorrect: String,
  #[serde(default)]
  pub xp_reward: i64,
}

/// The full result of one generation request, in the order the model
/// produced it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseBatch {
  pub exercises: Vec<GeneratedExercise>,
}
