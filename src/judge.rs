use crate::openai::OpenAIClientTrait;
use crate::prompts::JUDGE_SYSTEM_PROMPT;
use crate::report::{EvaluationItem, JudgeVerdict};
use crate::templates;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    ResponseFormat,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Ways a single judge call can fail. All of them are recoverable: the item
/// gets an error verdict and the batch moves on.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Transport(String),
    #[error("judge response had no content")]
    EmptyResponse,
    #[error("judge response was not a JSON object: {0}")]
    Malformed(String),
}

/// `score` and `reasoning` as the judge returned them. Either can be absent,
/// and `score` is whatever JSON value the judge produced.
struct GradedAnswer {
    score: Option<Value>,
    reasoning: Option<Value>,
}

/// Grade one item against its template. Never fails: any error becomes an
/// error verdict with the failure described in `reasoning`.
pub async fn evaluate_single_item(
    client: &dyn OpenAIClientTrait,
    item: &EvaluationItem,
    template: &str,
    model: &str,
) -> JudgeVerdict {
    let prompt = templates::render(template, item);

    match score_answer(client, model, &prompt).await {
        Ok(graded) => {
            if let Some(score) = graded.score.as_ref().and_then(Value::as_f64)
            {
                if !(0.0..=5.0).contains(&score) {
                    warn!(
                        "Judge returned out-of-range score {} for item {}",
                        score, item.id
                    );
                }
            }
            JudgeVerdict::success(item, graded.score, graded.reasoning)
        }
        Err(e) => {
            error!("Error processing item {}: {}", item.id, e);
            JudgeVerdict::error(item, e.to_string())
        }
    }
}

async fn score_answer(
    client: &dyn OpenAIClientTrait,
    model: &str,
    prompt: &str,
) -> Result<GradedAnswer, JudgeError> {
    let system_message = ChatCompletionRequestMessage::System(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(JUDGE_SYSTEM_PROMPT)
            .build()
            .map_err(|e| {
                JudgeError::Transport(format!(
                    "Failed to build system message: {}",
                    e
                ))
            })?,
    );

    let user_message = ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| {
                JudgeError::Transport(format!(
                    "Failed to build user message: {}",
                    e
                ))
            })?,
    );

    // Deterministic sampling, JSON object response.
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([system_message, user_message])
        .temperature(0.0)
        .response_format(ResponseFormat::JsonObject)
        .build()
        .map_err(|e| {
            JudgeError::Transport(format!("Failed to build request: {}", e))
        })?;

    let response = client
        .chat_completion(request)
        .await
        .map_err(|e| JudgeError::Transport(e.to_string()))?;

    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .ok_or(JudgeError::EmptyResponse)?;

    let parsed: Value = serde_json::from_str(content)
        .map_err(|e| JudgeError::Malformed(e.to_string()))?;
    let object = parsed.as_object().ok_or_else(|| {
        JudgeError::Malformed("top-level value is not an object".to_string())
    })?;

    Ok(GradedAnswer {
        score: object.get("score").cloned(),
        reasoning: object.get("reasoning").cloned(),
    })
}
