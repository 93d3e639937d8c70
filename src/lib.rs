use crate::openai::{real::create_openai_client, OpenAIClientTrait};
use anyhow::Result;
use std::sync::Arc;

pub mod app;
pub mod cli;
pub mod judge;
pub mod openai;
pub mod prompts;
pub mod report;
pub mod templates;

pub mod test_utils;

/// Shared run state: the judge client and the model it is asked for.
/// Built once at startup and held for the duration of the run.
pub struct AppState {
    pub judge_client: Arc<dyn OpenAIClientTrait>,
    pub judge_model: String,
}

/// AppState configuration as collected from the CLI and environment.
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub judge_model: String,
}

/// Build the run state. A missing API key is a startup error: without a
/// judge client there is nothing useful the run could do.
pub fn create_app_state(config: AppConfig) -> Result<Arc<AppState>> {
    let judge_client = create_openai_client(
        config.openai_api_key,
        config.openai_api_base,
    )?;

    Ok(Arc::new(AppState {
        judge_client,
        judge_model: config.judge_model,
    }))
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("judge_model", &self.judge_model)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Minimal state around an injected (usually fake) client.
    pub fn new_for_testing_with_client(
        judge_client: Arc<dyn OpenAIClientTrait>,
    ) -> Self {
        Self {
            judge_client,
            judge_model: "judge-test-model".to_string(),
        }
    }
}
