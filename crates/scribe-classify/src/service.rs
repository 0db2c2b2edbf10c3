use scribe_core::ClassifierConfig;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

/// One chat-completion call: a fixed system instruction plus one user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// An external reasoning service. Implemented by [`OpenAiChatService`]
/// and, in tests, by `MockReasoningService`.
#[async_trait::async_trait]
pub trait ReasoningService: Send + Sync {
    /// Return the raw completion text. No retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClassifyError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatService {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatService {
    /// Build a client from config. Fails when no API key is set.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ClassifyError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl ReasoningService for OpenAiChatService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClassifyError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        tracing::debug!(model = %self.model, prompt_chars = request.user.len(), "calling reasoning service");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ClassifyError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_configured() {
        let config = ClassifierConfig::default();
        assert!(matches!(
            OpenAiChatService::from_config(&config),
            Err(ClassifyError::NotConfigured)
        ));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let mut config = ClassifierConfig::default();
        config.api_key = Some("k".into());
        config.api_base = "http://localhost:8080/v1/".into();
        let svc = OpenAiChatService::from_config(&config).unwrap();
        assert_eq!(svc.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "prompt",
                },
            ],
            temperature: 0.1,
            max_tokens: 200,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "prompt");
        assert_eq!(v["max_tokens"], 200);
    }

    #[test]
    fn response_without_choices_parses() {
        let r: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(r.choices.is_empty());
    }
}
