use anyhow::Result;
use async_openai::types::{
    ChatChoice, ChatCompletionRequestMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionResponseMessage,
    CompletionUsage, CreateChatCompletionRequest,
    CreateChatCompletionResponse, FinishReason, Role,
};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::openai::{ModelRequest, OpenAIClientTrait};

/// What the fake client should do for one call.
enum FakeReply {
    /// Return a normal completion with this content (`None` = a completion
    /// whose message carries no content at all).
    Content(Option<String>),
    /// Fail the call, as a transport error would.
    Error(String),
}

/// A fake OpenAI client for tests.
///
/// Replies are consumed in the order they were configured, one per call,
/// and every request is recorded so tests can assert on call counts and
/// the model used. With no replies configured it returns a plausible
/// default verdict.
///
/// # Example
///
/// ```
/// use benchjudge::openai::fake::FakeOpenAIClient;
///
/// let client = FakeOpenAIClient::new()
///     .with_response(r#"{"score": 4, "reasoning": "ok"}"#)
///     .with_error("connection reset");
/// assert_eq!(client.request_count(), 0);
/// ```
pub struct FakeOpenAIClient {
    replies: Mutex<Vec<FakeReply>>,
    // Track requests for verification in tests
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl Default for FakeOpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeOpenAIClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(vec![]),
            requests: Mutex::new(vec![]),
        }
    }

    /// Queue a completion whose content is `response`.
    pub fn with_response(self, response: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(FakeReply::Content(Some(response.to_string())));
        self
    }

    /// Queue several completions at once, returned in order.
    pub fn with_responses(self, responses: Vec<&str>) -> Self {
        {
            let mut replies = self.replies.lock().unwrap();
            for response in responses {
                replies.push(FakeReply::Content(Some(response.to_string())));
            }
        }
        self
    }

    /// Queue a completion whose message has no content.
    pub fn with_none_content_response(self) -> Self {
        self.replies.lock().unwrap().push(FakeReply::Content(None));
        self
    }

    /// Queue a failed call.
    pub fn with_error(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(FakeReply::Error(message.to_string()));
        self
    }

    /// How many calls this client has seen.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn user_text(request: &CreateChatCompletionRequest) -> Option<String> {
        request.messages.iter().find_map(|message| match message {
            ChatCompletionRequestMessage::User(user) => match &user.content {
                ChatCompletionRequestUserMessageContent::Text(text) => {
                    Some(text.clone())
                }
                _ => None,
            },
            _ => None,
        })
    }

    #[allow(deprecated)]
    fn completion_with_content(
        model: &str,
        content: Option<String>,
    ) -> CreateChatCompletionResponse {
        let message = ChatCompletionResponseMessage {
            role: Role::Assistant,
            content,
            #[allow(deprecated)]
            function_call: None,
            tool_calls: None,
            refusal: None,
            audio: None,
        };

        let chat_choice = ChatChoice {
            index: 0,
            message,
            finish_reason: Some(FinishReason::Stop),
            logprobs: None,
        };

        let usage = CompletionUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            prompt_tokens_details: None,
            completion_tokens_details: None,
        };

        CreateChatCompletionResponse {
            id: "fake_id".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model: model.to_string(),
            system_fingerprint: Some("fake-fingerprint".to_string()),
            service_tier: None,
            choices: vec![chat_choice],
            usage: Some(usage),
        }
    }
}

#[async_trait]
impl OpenAIClientTrait for FakeOpenAIClient {
    async fn chat_completion(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error> {
        // Store the request for later verification
        self.requests.lock().unwrap().push(ModelRequest {
            model_name: request.model.clone(),
            user_message: Self::user_text(&request),
            temperature: request.temperature,
        });

        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.is_empty() {
            FakeReply::Content(Some(
                r#"{"score": 3, "reasoning": "fake default verdict"}"#
                    .to_string(),
            ))
        } else {
            replies.remove(0)
        };

        match reply {
            FakeReply::Content(content) => {
                Ok(Self::completion_with_content(&request.model, content))
            }
            FakeReply::Error(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::CreateChatCompletionRequestArgs;

    fn request_for(model: &str) -> CreateChatCompletionRequest {
        CreateChatCompletionRequestArgs::default()
            .model(model)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn replies_are_consumed_in_order() -> Result<(), anyhow::Error> {
        let client = FakeOpenAIClient::new()
            .with_response("first")
            .with_response("second");

        let response1 =
            client.chat_completion(request_for("gpt-4o")).await.unwrap();
        assert_eq!(
            response1.choices[0].message.content,
            Some("first".to_string())
        );

        let response2 =
            client.chat_completion(request_for("gpt-4o")).await.unwrap();
        assert_eq!(
            response2.choices[0].message.content,
            Some("second".to_string())
        );

        // With the queue drained, the default verdict comes back.
        let response3 =
            client.chat_completion(request_for("gpt-4o")).await.unwrap();
        let content = response3.choices[0].message.content.clone().unwrap();
        assert!(content.contains("fake default verdict"));

        Ok(())
    }

    #[tokio::test]
    async fn error_reply_fails_the_call() {
        let client = FakeOpenAIClient::new().with_error("connection reset");

        let result = client.chat_completion(request_for("gpt-4o")).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn none_content_reply_has_empty_message() {
        let client = FakeOpenAIClient::new().with_none_content_response();

        let response =
            client.chat_completion(request_for("gpt-4o")).await.unwrap();
        assert_eq!(response.choices[0].message.content, None);
    }

    #[tokio::test]
    async fn requests_are_tracked() {
        let client = FakeOpenAIClient::new().with_response("tracked");

        let _ = client.chat_completion(request_for("gpt-4o")).await.unwrap();

        assert_eq!(client.request_count(), 1);
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].model_name, "gpt-4o");
        assert_eq!(requests[0].user_message, None);
        assert_eq!(requests[0].temperature, None);
    }
}
