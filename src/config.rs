//! Loading curriculum configuration (skills, level rules, exercise types,
//! prompts) from TOML.
//!
//! The pipeline only depends on the shape of these mappings, never their
//! contents, so curriculum changes need no rebuild. An absent or invalid
//! file leaves the built-in catalog in place.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tracing::{error, info};

use crate::catalog::{
  default_exercise_types, default_level_rules, default_skills, CROWN_LEVEL_MAX, CROWN_LEVEL_MIN,
  EXERCISE_TYPE_COUNT,
};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CurriculumConfig {
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub skills: Vec<SkillCfg>,
  #[serde(default)]
  pub levels: Vec<LevelRuleCfg>,
  #[serde(default)]
  pub exercise_types: Vec<String>,
}

/// Skill entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct SkillCfg {
  pub id: String,
  pub description: String,
}

/// Per-crown-level authoring rule accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelRuleCfg {
  pub level: u8,
  pub rule: String,
}

/// Prompts used by the generation client. Defaults produce age-appropriate
/// character-education exercises; override them in TOML to tune tone.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub generation_system: String,
  pub generation_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      generation_system: "You are a curriculum designer for children's character education. You create engaging, age-appropriate exercises that help kids practice values in everyday situations. Respond ONLY with strict JSON.".into(),
      generation_user_template: "Create exactly {exercise_count} learning exercises for this skill.\n\nSkill: {skill_description}\n\nAuthoring rules for this crown level:\n{level_rule}\n\nExercise types (use each type at most once):\n{exercise_types}\n\nAward between 8 and 22 xpReward per exercise, scaled by effort.\n\nReturn JSON with exactly this shape:\n{output_schema}".into(),
    }
  }
}

/// The resolved curriculum the pipeline works against. Immutable for the
/// process lifetime.
#[derive(Clone, Debug)]
pub struct Curriculum {
  /// skill id -> human-readable description
  pub skills: HashMap<String, String>,
  /// crown level -> authoring rule text
  pub level_rules: HashMap<u8, String>,
  /// ordered, fixed-size set of type tags
  pub exercise_types: Vec<String>,
}

impl Default for Curriculum {
  fn default() -> Self {
    Self {
      skills: default_skills(),
      level_rules: default_level_rules(),
      exercise_types: default_exercise_types(),
    }
  }
}

impl Curriculum {
  /// Merge a loaded config over the defaults. A non-empty section replaces
  /// its default wholesale; the merged result must satisfy the catalog
  /// invariants or the whole file is rejected.
  pub fn from_config(cfg: &CurriculumConfig) -> Result<Self, String> {
    let mut cur = Curriculum::default();

    if !cfg.skills.is_empty() {
      let mut skills = HashMap::with_capacity(cfg.skills.len());
      for s in &cfg.skills {
        if s.id.trim().is_empty() || s.description.trim().is_empty() {
          return Err("skills entries need a non-empty id and description".into());
        }
        if skills.insert(s.id.clone(), s.description.clone()).is_some() {
          return Err(format!("duplicate skill id: {}", s.id));
        }
      }
      cur.skills = skills;
    }

    if !cfg.levels.is_empty() {
      let mut rules = HashMap::with_capacity(cfg.levels.len());
      for l in &cfg.levels {
        if !(CROWN_LEVEL_MIN..=CROWN_LEVEL_MAX).contains(&l.level) {
          return Err(format!("level {} is outside {}..={}", l.level, CROWN_LEVEL_MIN, CROWN_LEVEL_MAX));
        }
        if l.rule.trim().is_empty() {
          return Err(format!("level {} has an empty rule text", l.level));
        }
        if rules.insert(l.level, l.rule.clone()).is_some() {
          return Err(format!("duplicate level: {}", l.level));
        }
      }
      for level in CROWN_LEVEL_MIN..=CROWN_LEVEL_MAX {
        if !rules.contains_key(&level) {
          return Err(format!("levels must cover {}..={}; missing {}", CROWN_LEVEL_MIN, CROWN_LEVEL_MAX, level));
        }
      }
      cur.level_rules = rules;
    }

    if !cfg.exercise_types.is_empty() {
      let distinct: HashSet<&str> = cfg.exercise_types.iter().map(|t| t.as_str()).collect();
      if cfg.exercise_types.len() != EXERCISE_TYPE_COUNT || distinct.len() != EXERCISE_TYPE_COUNT {
        return Err(format!("exercise_types must hold exactly {} distinct tags", EXERCISE_TYPE_COUNT));
      }
      if cfg.exercise_types.iter().any(|t| t.trim().is_empty()) {
        return Err("exercise_types entries must be non-empty".into());
      }
      cur.exercise_types = cfg.exercise_types.clone();
    }

    Ok(cur)
  }
}

/// Attempt to load the curriculum + prompts from CURRICULUM_CONFIG_PATH.
/// On any IO/parsing/validation error, returns None (defaults are used).
pub fn load_curriculum_from_env() -> Option<(Curriculum, Prompts)> {
  let path = std::env::var("CURRICULUM_CONFIG_PATH").ok()?;
  let raw = match std::fs::read_to_string(&path) {
    Ok(s) => s,
    Err(e) => {
      error!(target: "brightpath_backend", %path, error = %e, "Failed to read curriculum TOML file");
      return None;
    }
  };
  let cfg = match toml::from_str::<CurriculumConfig>(&raw) {
    Ok(cfg) => cfg,
    Err(e) => {
      error!(target: "brightpath_backend", %path, error = %e, "Failed to parse curriculum TOML");
      return None;
    }
  };
  match Curriculum::from_config(&cfg) {
    Ok(cur) => {
      let version = cfg.version.as_deref().unwrap_or("unversioned");
      info!(target: "brightpath_backend", %path, %version, "Loaded curriculum config (TOML)");
      Some((cur, cfg.prompts))
    }
    Err(e) => {
      error!(target: "brightpath_backend", %path, error = %e, "Rejected curriculum TOML");
      None
    }
  }
}
