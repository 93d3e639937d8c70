use crate::openai::OpenAIClientTrait;
use anyhow::Result;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    CreateChatCompletionRequest, CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use std::sync::Arc;

// A real implementation of the OpenAI client
pub struct RealOpenAIClient {
    client: Client<OpenAIConfig>,
}

impl RealOpenAIClient {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }
}

/// Build the real client from CLI/env configuration. The API key is
/// required; the base URL falls back to the library default when unset.
pub fn create_openai_client(
    api_key: Option<String>,
    api_base: Option<String>,
) -> Result<Arc<dyn OpenAIClientTrait>> {
    let api_key = api_key
        .ok_or_else(|| anyhow::anyhow!("OpenAI API key not configured"))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(api_base) = api_base {
        config = config.with_api_base(api_base);
    }

    Ok(Arc::new(RealOpenAIClient::new(Client::with_config(config))))
}

#[async_trait]
impl OpenAIClientTrait for RealOpenAIClient {
    async fn chat_completion(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error> {
        let response = self.client.chat().create(request).await?;
        Ok(response)
    }
}
