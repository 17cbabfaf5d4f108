//! Application state: the resolved curriculum, prompts, and external
//! service clients.
//!
//! Everything here is read-only after startup. The pipeline constructs and
//! discards its own request-scoped values, so concurrent requests share
//! nothing mutable and no locking is needed.

use tracing::{info, instrument};

use crate::config::{load_curriculum_from_env, Curriculum, Prompts};
use crate::llm::OpenAI;
use crate::voice::VoiceClient;

#[derive(Clone)]
pub struct AppState {
    pub curriculum: Curriculum,
    pub prompts: Prompts,
    pub openai: Option<OpenAI>,
    pub voice: Option<VoiceClient>,
}

impl AppState {
    /// Build state from env: load curriculum config, init service clients.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let (curriculum, prompts) = load_curriculum_from_env()
            .unwrap_or_else(|| (Curriculum::default(), Prompts::default()));

        info!(
            target: "exercise",
            skills = curriculum.skills.len(),
            levels = curriculum.level_rules.len(),
            exercise_types = curriculum.exercise_types.len(),
            "Startup curriculum inventory"
        );

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "brightpath_backend", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
        } else {
            info!(target: "brightpath_backend", "OpenAI disabled (no OPENAI_API_KEY). Generation requests will be refused.");
        }

        let voice = VoiceClient::from_env();
        if let Some(v) = &voice {
            info!(target: "brightpath_backend", base_url = %v.base_url, voice = %v.voice_id, model = %v.model_id, "Voice synthesis enabled.");
        } else {
            info!(target: "brightpath_backend", "Voice synthesis disabled (no ELEVEN_API_KEY).");
        }

        Self { curriculum, prompts, openai, voice }
    }
}
