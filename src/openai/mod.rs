pub mod fake;
pub mod real;

use anyhow::Result;
use async_openai::types::{
    CreateChatCompletionRequest, CreateChatCompletionResponse,
};
use async_trait::async_trait;

/// Record of one request a client saw, kept so tests can assert on how many
/// calls were issued and what was actually sent.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model_name: String,
    pub user_message: Option<String>,
    pub temperature: Option<f32>,
}

/// Abstracts the OpenAI chat API behind a trait so the judge can run against
/// either the real service or a canned fake in tests.
///
/// The caller builds the full request (model, messages, sampling settings);
/// implementations only transport it.
#[async_trait]
pub trait OpenAIClientTrait: Send + Sync {
    async fn chat_completion(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error>;
}
