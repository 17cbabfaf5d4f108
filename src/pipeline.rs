//! The exercise request pipeline: validate, resolve, compose, invoke, parse,
//! and schema-check — plus the speech-synthesis passthrough.
//!
//! All request validation happens before any outbound call; a rejected
//! request never touches the network. There are no retries: one failed
//! attempt is reported to the caller as-is (generation runs per admin
//! action, not on an availability-critical path).

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::Curriculum;
use crate::domain::ExerciseBatch;
use crate::error::AppError;
use crate::prompt::compose_user_prompt;
use crate::protocol::{GenerateExercisesIn, TtsIn, TtsOut};
use crate::state::AppState;
use crate::voice::AUDIO_MIME;

pub const MIN_EXERCISE_COUNT: u8 = 6;
pub const MAX_EXERCISE_COUNT: u8 = 8;
pub const DEFAULT_EXERCISE_COUNT: u8 = 7;

const XP_REWARD_MIN: i64 = 8;
const XP_REWARD_MAX: i64 = 22;
const OPTION_COUNT: usize = 4;

const MAX_TTS_CHARS: usize = 2000;

/// A request that has passed every gate, with curriculum text resolved.
#[derive(Debug)]
pub struct ValidRequest<'a> {
  pub skill_id: &'a str,
  pub skill_description: &'a str,
  pub crown_level: u8,
  pub level_rule: &'a str,
  pub exercise_count: u8,
}

/// Gate order: field presence, then skill resolution, then range checks.
/// Unknown skills never fall back to a default.
pub fn validate_request<'a>(
  curriculum: &'a Curriculum,
  input: &'a GenerateExercisesIn,
) -> Result<ValidRequest<'a>, AppError> {
  let skill_id = input
    .skill_id
    .as_deref()
    .filter(|s| !s.trim().is_empty())
    .ok_or_else(|| AppError::Validation("skillId is required".into()))?;
  let crown_level = input
    .crown_level
    .ok_or_else(|| AppError::Validation("crownLevel is required".into()))?;

  let skill_description = curriculum
    .skills
    .get(skill_id)
    .map(String::as_str)
    .ok_or_else(|| AppError::Validation(format!("unknown skillId: {skill_id}")))?;

  let (level, level_rule) = u8::try_from(crown_level)
    .ok()
    .and_then(|l| curriculum.level_rules.get(&l).map(|r| (l, r.as_str())))
    .ok_or_else(|| {
      AppError::Validation(format!("crownLevel must be between 1 and 5, got {crown_level}"))
    })?;

  let exercise_count = match input.exercise_count {
    None => DEFAULT_EXERCISE_COUNT,
    Some(n) => u8::try_from(n)
      .ok()
      .filter(|c| (MIN_EXERCISE_COUNT..=MAX_EXERCISE_COUNT).contains(c))
      .ok_or_else(|| {
        AppError::Validation(format!(
          "exerciseCount must be between {MIN_EXERCISE_COUNT} and {MAX_EXERCISE_COUNT}, got {n}"
        ))
      })?,
  };

  Ok(ValidRequest { skill_id, skill_description, crown_level: level, level_rule, exercise_count })
}

/// Schema-check a parsed batch before it reaches the caller.
///
/// Structural violations reject the batch; soft prompt-contract expectations
/// (type uniqueness, exact count) only warn. Blank exercise ids are repaired
/// with server-generated UUIDs since the server owns identity.
pub fn validate_batch(
  curriculum: &Curriculum,
  requested: u8,
  batch: &mut ExerciseBatch,
) -> Result<(), AppError> {
  if batch.exercises.is_empty() {
    return Err(AppError::Parsing("generation response contained no exercises".into()));
  }
  if batch.exercises.len() != requested as usize {
    warn!(target: "exercise", requested, got = batch.exercises.len(), "Exercise count differs from request");
  }

  let mut seen_types: Vec<&str> = Vec::with_capacity(batch.exercises.len());
  for (i, ex) in batch.exercises.iter().enumerate() {
    if !curriculum.exercise_types.iter().any(|t| t == &ex.exercise_type) {
      return Err(AppError::Parsing(format!("exercise {i}: unknown type '{}'", ex.exercise_type)));
    }
    if seen_types.contains(&ex.exercise_type.as_str()) {
      warn!(target: "exercise", index = i, kind = %ex.exercise_type, "Repeated exercise type in one batch");
    }
    seen_types.push(&ex.exercise_type);

    for (field, value) in [
      ("promptText", &ex.prompt_text),
      ("hintText", &ex.hint_text),
      ("feedbackCorrect", &ex.feedback_correct),
      ("feedbackIncorrect", &ex.feedback_incorrect),
    ] {
      if value.trim().is_empty() {
        return Err(AppError::Parsing(format!("exercise {i}: {field} is empty")));
      }
    }

    if let Some(options) = &ex.options {
      if options.len() != OPTION_COUNT {
        return Err(AppError::Parsing(format!(
          "exercise {i}: options must hold exactly {OPTION_COUNT} entries, got {}",
          options.len()
        )));
      }
      match &ex.correct_answer {
        Some(ans) if options[0] == *ans => {}
        Some(_) => {
          return Err(AppError::Parsing(format!(
            "exercise {i}: correctAnswer must be listed first in options"
          )));
        }
        None => {
          return Err(AppError::Parsing(format!(
            "exercise {i}: options present but correctAnswer missing"
          )));
        }
      }
    }

    if !(XP_REWARD_MIN..=XP_REWARD_MAX).contains(&ex.xp_reward) {
      return Err(AppError::Parsing(format!(
        "exercise {i}: xpReward must be between {XP_REWARD_MIN} and {XP_REWARD_MAX}, got {}",
        ex.xp_reward
      )));
    }
  }

  for ex in batch.exercises.iter_mut() {
    if ex.exercise_id.trim().is_empty() {
      ex.exercise_id = Uuid::new_v4().to_string();
      debug!(target: "exercise", id = %ex.exercise_id, "Assigned server-side exercise id");
    }
  }

  Ok(())
}

/// The full generation pipeline. Exactly one outbound call on the happy
/// path; no local state survives the request.
#[instrument(level = "info", skip(state, input), fields(skill = input.skill_id.as_deref().unwrap_or("-")))]
pub async fn generate_exercises(
  state: &AppState,
  input: &GenerateExercisesIn,
) -> Result<ExerciseBatch, AppError> {
  let req = validate_request(&state.curriculum, input)?;
  debug!(target: "exercise", skill = req.skill_id, level = req.crown_level, count = req.exercise_count, "Generation request validated");

  let prompt = compose_user_prompt(
    &state.prompts,
    req.skill_description,
    req.level_rule,
    &state.curriculum.exercise_types,
    req.exercise_count,
  );

  let openai = state.openai.as_ref().ok_or_else(|| {
    AppError::Configuration("OPENAI_API_KEY is not set; exercise generation is disabled".into())
  })?;

  let mut batch = openai.generate_exercise_batch(&state.prompts, &prompt).await?;
  validate_batch(&state.curriculum, req.exercise_count, &mut batch)?;
  Ok(batch)
}

/// The speech-synthesis passthrough: validate, call the voice service,
/// hand the audio back base64-encoded.
#[instrument(level = "info", skip(state, input), fields(text_len = input.text.as_deref().map(str::len).unwrap_or(0)))]
pub async fn synthesize_speech(state: &AppState, input: &TtsIn) -> Result<TtsOut, AppError> {
  use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

  let text = input
    .text
    .as_deref()
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Validation("text is required".into()))?;
  if text.chars().count() > MAX_TTS_CHARS {
    return Err(AppError::Validation(format!("text too long (max {MAX_TTS_CHARS} characters)")));
  }

  let voice = state.voice.as_ref().ok_or_else(|| {
    AppError::Configuration("ELEVEN_API_KEY is not set; speech synthesis is disabled".into())
  })?;

  let audio = voice.synthesize(text, input.voice_id.as_deref()).await?;
  Ok(TtsOut { audio_base64: B64.encode(audio), mime: AUDIO_MIME.into() })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Curriculum, Prompts};
  use crate::domain::GeneratedExercise;
  use crate::llm::OpenAI;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn test_curriculum() -> Curriculum {
    Curriculum::default()
  }

  fn gen_in(skill: &str, level: i64, count: Option<i64>) -> GenerateExercisesIn {
    GenerateExercisesIn {
      skill_id: Some(skill.into()),
      crown_level: Some(level),
      exercise_count: count,
    }
  }

  fn sample_exercise(id: &str, kind: &str) -> GeneratedExercise {
    GeneratedExercise {
      exercise_id: id.into(),
      exercise_type: kind.into(),
      prompt_text: "Maya's friend looks sad at recess. What is one loving thing Maya could do?".into(),
      image_desc: None,
      audio_transcript: None,
      options: Some(vec![
        "Ask her friend what is wrong and listen".into(),
        "Ignore it and keep playing".into(),
        "Tell everyone her friend is crying".into(),
        "Wait for a teacher to notice".into(),
      ]),
      correct_answer: Some("Ask her friend what is wrong and listen".into()),
      hint_text: "Think about what would make you feel cared for.".into(),
      feedback_correct: "Yes! Checking in shows real love for a friend.".into(),
      feedback_incorrect: "Not quite. Love means noticing and helping.".into(),
      xp_reward: 12,
    }
  }

  fn sample_batch() -> ExerciseBatch {
    let mut reflection = sample_exercise("ex-2", "reflection");
    reflection.options = None;
    reflection.correct_answer = None;
    reflection.prompt_text = "Write about a time someone showed you love this week.".into();
    reflection.xp_reward = 20;
    ExerciseBatch { exercises: vec![sample_exercise("ex-1", "multiple_choice"), reflection] }
  }

  fn state_with(openai: Option<OpenAI>) -> AppState {
    AppState {
      curriculum: test_curriculum(),
      prompts: Prompts::default(),
      openai,
      voice: None,
    }
  }

  fn mock_openai(server: &MockServer) -> OpenAI {
    OpenAI {
      client: reqwest::Client::new(),
      api_key: "test-key".into(),
      base_url: server.uri(),
      model: "gpt-4o-mini".into(),
    }
  }

  fn completion_envelope(content: &str) -> serde_json::Value {
    json!({
      "choices": [{ "message": { "role": "assistant", "content": content } }],
      "usage": { "prompt_tokens": 700, "completion_tokens": 900, "total_tokens": 1600 }
    })
  }

  // --- request validation ---

  #[test]
  fn missing_skill_id_is_rejected() {
    let cur = test_curriculum();
    let input = GenerateExercisesIn { skill_id: None, crown_level: Some(1), exercise_count: None };
    let err = validate_request(&cur, &input).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
  }

  #[test]
  fn unknown_skill_id_is_rejected() {
    let cur = test_curriculum();
    let err = validate_request(&cur, &gen_in("bogus", 1, None)).unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m.contains("bogus")));
  }

  #[test]
  fn crown_level_out_of_range_is_rejected() {
    let cur = test_curriculum();
    for level in [0, 6, -1] {
      let err = validate_request(&cur, &gen_in("u2s2", level, None)).unwrap_err();
      assert!(matches!(err, AppError::Validation(_)), "level {level} should fail");
    }
  }

  #[test]
  fn exercise_count_out_of_range_is_rejected() {
    let cur = test_curriculum();
    for count in [5, 9, 0] {
      let err = validate_request(&cur, &gen_in("u1s1", 1, Some(count))).unwrap_err();
      assert!(matches!(err, AppError::Validation(_)), "count {count} should fail");
    }
  }

  #[test]
  fn count_defaults_to_seven_and_skill_resolves() {
    let cur = test_curriculum();
    let input = gen_in("u1s1", 1, None);
    let req = validate_request(&cur, &input).expect("valid");
    assert_eq!(req.exercise_count, DEFAULT_EXERCISE_COUNT);
    assert_eq!(req.crown_level, 1);
    assert!(req.skill_description.starts_with("The Love Map"));
  }

  // --- batch validation ---

  #[test]
  fn well_formed_batch_passes_unchanged() {
    let cur = test_curriculum();
    let mut batch = sample_batch();
    validate_batch(&cur, 7, &mut batch).expect("valid");
    assert_eq!(batch, sample_batch());
  }

  #[test]
  fn empty_batch_is_a_parsing_error() {
    let cur = test_curriculum();
    let mut batch = ExerciseBatch::default();
    assert!(matches!(validate_batch(&cur, 7, &mut batch), Err(AppError::Parsing(_))));
  }

  #[test]
  fn unknown_exercise_type_is_rejected() {
    let cur = test_curriculum();
    let mut batch = ExerciseBatch { exercises: vec![sample_exercise("ex-1", "karaoke")] };
    assert!(matches!(validate_batch(&cur, 6, &mut batch), Err(AppError::Parsing(_))));
  }

  #[test]
  fn wrong_option_count_is_rejected() {
    let cur = test_curriculum();
    let mut ex = sample_exercise("ex-1", "multiple_choice");
    ex.options = Some(vec!["only".into(), "two".into()]);
    ex.correct_answer = Some("only".into());
    let mut batch = ExerciseBatch { exercises: vec![ex] };
    assert!(matches!(validate_batch(&cur, 6, &mut batch), Err(AppError::Parsing(_))));
  }

  #[test]
  fn correct_answer_must_lead_the_options() {
    let cur = test_curriculum();
    let mut ex = sample_exercise("ex-1", "multiple_choice");
    ex.correct_answer = Some("Ignore it and keep playing".into());
    let mut batch = ExerciseBatch { exercises: vec![ex] };
    assert!(matches!(validate_batch(&cur, 6, &mut batch), Err(AppError::Parsing(_))));
  }

  #[test]
  fn xp_reward_outside_bounds_is_rejected() {
    let cur = test_curriculum();
    for xp in [0, 7, 23, 50] {
      let mut ex = sample_exercise("ex-1", "multiple_choice");
      ex.xp_reward = xp;
      let mut batch = ExerciseBatch { exercises: vec![ex] };
      assert!(matches!(validate_batch(&cur, 6, &mut batch), Err(AppError::Parsing(_))), "xp {xp}");
    }
  }

  #[test]
  fn blank_exercise_ids_are_repaired() {
    let cur = test_curriculum();
    let mut batch = ExerciseBatch { exercises: vec![sample_exercise("", "multiple_choice")] };
    validate_batch(&cur, 6, &mut batch).expect("valid");
    assert!(!batch.exercises[0].exercise_id.is_empty());
  }

  // --- pipeline against a mocked generation service ---

  #[tokio::test]
  async fn well_formed_response_round_trips_field_for_field() {
    let server = MockServer::start().await;
    let expected = sample_batch();
    let content = serde_json::to_string(&expected).expect("fixture json");
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(completion_envelope(&content)))
      .expect(1)
      .mount(&server)
      .await;

    let state = state_with(Some(mock_openai(&server)));
    let got = generate_exercises(&state, &gen_in("u1s1", 1, Some(7))).await.expect("batch");
    assert_eq!(got, expected);
  }

  #[tokio::test]
  async fn unparseable_content_is_a_parsing_error_not_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(completion_envelope("here are your exercises!")))
      .mount(&server)
      .await;

    let state = state_with(Some(mock_openai(&server)));
    let err = generate_exercises(&state, &gen_in("u1s1", 1, None)).await.unwrap_err();
    assert!(matches!(err, AppError::Parsing(_)), "got {err:?}");
  }

  #[tokio::test]
  async fn schema_violation_in_valid_json_is_a_parsing_error() {
    let server = MockServer::start().await;
    let mut bad = sample_batch();
    bad.exercises[0].xp_reward = 50;
    let content = serde_json::to_string(&bad).expect("fixture json");
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(completion_envelope(&content)))
      .mount(&server)
      .await;

    let state = state_with(Some(mock_openai(&server)));
    let err = generate_exercises(&state, &gen_in("u1s1", 1, None)).await.unwrap_err();
    assert!(matches!(err, AppError::Parsing(ref m) if m.contains("xpReward")), "got {err:?}");
  }

  #[tokio::test]
  async fn upstream_failure_is_a_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/chat/completions"))
      .respond_with(
        ResponseTemplate::new(500).set_body_json(json!({ "error": { "message": "boom" } })),
      )
      .mount(&server)
      .await;

    let state = state_with(Some(mock_openai(&server)));
    let err = generate_exercises(&state, &gen_in("u1s1", 1, None)).await.unwrap_err();
    assert!(matches!(err, AppError::Service(ref m) if m.contains("500") && m.contains("boom")), "got {err:?}");
  }

  #[tokio::test]
  async fn validation_failure_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let state = state_with(Some(mock_openai(&server)));
    for input in [gen_in("bogus", 1, None), gen_in("u2s2", 6, None), gen_in("u1s1", 1, Some(9))] {
      let err = generate_exercises(&state, &input).await.unwrap_err();
      assert!(matches!(err, AppError::Validation(_)));
    }
    let received = server.received_requests().await;
    assert!(received.map_or(true, |r| r.is_empty()));
  }

  #[tokio::test]
  async fn missing_credential_is_a_configuration_error() {
    let state = state_with(None);
    let err = generate_exercises(&state, &gen_in("u1s1", 1, None)).await.unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
  }

  #[tokio::test]
  async fn tts_rejects_empty_text_before_any_call() {
    let state = state_with(None);
    let input = TtsIn { text: Some("   ".into()), voice_id: None };
    let err = synthesize_speech(&state, &input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
  }

  #[tokio::test]
  async fn tts_without_key_is_a_configuration_error() {
    let state = state_with(None);
    let input = TtsIn { text: Some("Great job today!".into()), voice_id: None };
    let err = synthesize_speech(&state, &input).await.unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
  }
}
