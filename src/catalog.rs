//! Built-in curriculum data: skills, crown-level rules, and exercise types.
//!
//! These defaults guarantee the service is usable without any external
//! curriculum file. A TOML file at CURRICULUM_CONFIG_PATH may replace any
//! section wholesale (see `config`).

use std::collections::HashMap;

/// The catalog always carries exactly this many exercise types; the prompt
/// contract tells the model to use each at most once per batch of 6-8.
pub const EXERCISE_TYPE_COUNT: usize = 8;

/// Crown levels run 1 (introduce) through 5 (apply under conflict).
pub const CROWN_LEVEL_MIN: u8 = 1;
pub const CROWN_LEVEL_MAX: u8 = 5;

/// The default skill catalog: five units of three skills, ids `u{unit}s{skill}`.
pub fn default_skills() -> HashMap<String, String> {
  HashMap::from([
    // Unit 1 - Love
    ("u1s1".into(), "The Love Map - Defining love and different types of love for ages 10-12".into()),
    ("u1s2".into(), "Love in Action - Showing love through everyday acts of kindness for ages 10-12".into()),
    ("u1s3".into(), "Loving Yourself - Building healthy self-worth and positive self-talk for ages 10-12".into()),
    // Unit 2 - Honesty
    ("u2s1".into(), "Truth Matters - Why honesty builds trust for ages 10-12".into()),
    ("u2s2".into(), "Little White Lies - Recognizing when small lies cause big harm for ages 10-12".into()),
    ("u2s3".into(), "Owning Mistakes - Telling the truth when it is hard for ages 10-12".into()),
    // Unit 3 - Courage
    ("u3s1".into(), "What Is Courage - Everyday bravery beyond heroics for ages 10-12".into()),
    ("u3s2".into(), "Speaking Up - Standing up for yourself and others for ages 10-12".into()),
    ("u3s3".into(), "Trying Again - Facing fear of failure with a growth mindset for ages 10-12".into()),
    // Unit 4 - Respect
    ("u4s1".into(), "Respect Basics - Treating people, places, and things with care for ages 10-12".into()),
    ("u4s2".into(), "Different Not Wrong - Respecting opinions and cultures unlike your own for ages 10-12".into()),
    ("u4s3".into(), "Listening Well - Showing respect through active listening for ages 10-12".into()),
    // Unit 5 - Responsibility
    ("u5s1".into(), "My Job, My Part - Taking responsibility at home and school for ages 10-12".into()),
    ("u5s2".into(), "Promises Kept - Following through on commitments for ages 10-12".into()),
    ("u5s3".into(), "Think It Through - Considering consequences before acting for ages 10-12".into()),
  ])
}

/// Authoring rules per crown level. The rule text is interpolated verbatim
/// into the generation prompt.
pub fn default_level_rules() -> HashMap<u8, String> {
  HashMap::from([
    (1u8, "Keep language simple and concrete. One idea per question. Focus on recognizing and naming the concept. Prefer picture-friendly scenarios and single-step answers.".into()),
    (2u8, "Use short everyday scenarios. Ask the learner to spot the concept in action and pick the best response from clearly distinct choices.".into()),
    (3u8, "Use multi-sentence scenarios with mild ambiguity. Ask the learner to apply the concept, not just recognize it. Distractors should be plausible.".into()),
    (4u8, "Use realistic social situations with competing concerns. Ask the learner to weigh choices and explain why one response is better than another.".into()),
    (5u8, "Use layered scenarios where values conflict. Ask the learner to predict consequences, justify decisions, and reflect on how they would act themselves.".into()),
  ])
}

/// The fixed, ordered exercise-type tags the model may draw from.
pub fn default_exercise_types() -> Vec<String> {
  vec![
    "multiple_choice".into(),
    "true_false".into(),
    "fill_in_blank".into(),
    "scenario_choice".into(),
    "matching".into(),
    "listening".into(),
    "picture_choice".into(),
    "reflection".into(),
  ]
}
