//! Deterministic prompt composition for the generation service.
//!
//! Composition is pure: the same (skill, level rule, type catalog, count)
//! always yields a byte-identical prompt, so generation behavior is
//! reproducible and testable independent of the external service.

use crate::config::Prompts;
use crate::util::fill_template;

/// The output shape the model is told to produce, embedded verbatim into the
/// user prompt. Kept as a single constant so the contract has exactly one
/// source of truth.
pub const GENERATION_OUTPUT_SCHEMA: &str = r#"{"exercises": [{
  "exerciseId": "unique string id",
  "type": "one of the listed exercise types",
  "promptText": "the question or task shown to the child",
  "imageDesc": "description of a supporting illustration, or null",
  "audioTranscript": "text to be spoken aloud, or null",
  "options": ["correct answer", "distractor", "distractor", "distractor"],
  "correctAnswer": "must equal the first entry of options",
  "hintText": "a short nudge that does not give the answer away",
  "feedbackCorrect": "encouraging message for a right answer",
  "feedbackIncorrect": "supportive message for a wrong answer",
  "xpReward": 8
}]}"#;

/// Interpolate the curriculum pieces into the configured user template.
pub fn compose_user_prompt(
  prompts: &Prompts,
  skill_description: &str,
  level_rule: &str,
  exercise_types: &[String],
  exercise_count: u8,
) -> String {
  let type_list = exercise_types
    .iter()
    .map(|t| format!("- {t}"))
    .collect::<Vec<_>>()
    .join("\n");
  let count = exercise_count.to_string();

  fill_template(
    &prompts.generation_user_template,
    &[
      ("exercise_count", count.as_str()),
      ("skill_description", skill_description),
      ("level_rule", level_rule),
      ("exercise_types", type_list.as_str()),
      ("output_schema", GENERATION_OUTPUT_SCHEMA),
    ],
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Curriculum;

  fn compose_u1s1_level1(count: u8) -> String {
    let cur = Curriculum::default();
    let prompts = Prompts::default();
    compose_user_prompt(
      &prompts,
      cur.skills.get("u1s1").expect("u1s1"),
      cur.level_rules.get(&1).expect("level 1"),
      &cur.exercise_types,
      count,
    )
  }

  #[test]
  fn composition_is_deterministic() {
    assert_eq!(compose_u1s1_level1(7), compose_u1s1_level1(7));
  }

  #[test]
  fn prompt_carries_skill_rule_and_count_verbatim() {
    let prompt = compose_u1s1_level1(7);
    assert!(prompt.contains("The Love Map - Defining love and different types of love for ages 10-12"));
    assert!(prompt.contains("Keep language simple and concrete."));
    assert!(prompt.contains("Create exactly 7 learning exercises"));
    assert!(prompt.contains("- multiple_choice"));
    assert!(prompt.contains("- reflection"));
    assert!(prompt.contains(GENERATION_OUTPUT_SCHEMA));
  }

  #[test]
  fn every_placeholder_is_filled() {
    let prompt = compose_u1s1_level1(6);
    for needle in [
      "{exercise_count}",
      "{skill_description}",
      "{level_rule}",
      "{exercise_types}",
      "{output_schema}",
    ] {
      assert!(!prompt.contains(needle), "unfilled placeholder {needle}");
    }
  }
}
