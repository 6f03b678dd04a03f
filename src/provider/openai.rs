//! OpenAI-compatible chat completions

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, http_client, GenerationRequest, TextGenerator};
use crate::config::TextConfig;
use crate::{Error, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Text generator for any OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiGenerator {
    api_base: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

impl OpenAiGenerator {
    pub fn new(config: &TextConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| Error::Config("OpenAI API key not configured".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        Ok(Self {
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client: http_client(headers, config.timeout)?,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        debug!("POST {} model={}", url, self.model);

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status("OpenAI", response).await?;
        let parsed: ChatCompletionResponse = response.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| Error::Provider("OpenAI returned no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "local-model",
                "messages": [{"role": "user", "content": "Detect the language of this text: hola"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Spanish"}}]
            })))
            .mount(&server)
            .await;

        let config = TextConfig {
            api_base: Some(server.uri()),
            api_key: Some("k".to_string()),
            model: Some("local-model".to_string()),
            ..TextConfig::default()
        };
        let generator = OpenAiGenerator::new(&config).unwrap();
        let text = generator
            .generate(GenerationRequest::new("Detect the language of this text: hola", 50))
            .await
            .unwrap();
        assert_eq!(text, "Spanish");
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let config = TextConfig {
            api_base: Some(server.uri()),
            api_key: Some("k".to_string()),
            ..TextConfig::default()
        };
        let generator = OpenAiGenerator::new(&config).unwrap();
        assert!(generator
            .generate(GenerationRequest::new("hi", 10))
            .await
            .is_err());
    }
}
