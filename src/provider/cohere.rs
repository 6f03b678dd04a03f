//! Cohere generate API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, http_client, GenerationRequest, TextGenerator};
use crate::config::TextConfig;
use crate::{Error, Result};

const DEFAULT_API_BASE: &str = "https://api.cohere.ai";

/// Text generator backed by Cohere's `/v1/generate`
pub struct CohereGenerator {
    api_base: String,
    model: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    text: String,
}

impl CohereGenerator {
    pub fn new(config: &TextConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| Error::Config("Cohere API key not configured".to_string()))?;

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
            model: config.model.clone(),
            client: http_client(headers, config.timeout)?,
        })
    }
}

#[async_trait]
impl TextGenerator for CohereGenerator {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let url = format!("{}/v1/generate", self.api_base.trim_end_matches('/'));
        debug!("POST {} ({} max tokens)", url, request.max_tokens);

        let body = GenerateBody {
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            model: self.model.as_deref(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status("Cohere", response).await?;
        let parsed: GenerateResponse = response.json().await?;

        parsed
            .generations
            .into_iter()
            .next()
            .map(|g| g.text.trim().to_string())
            .ok_or_else(|| Error::Provider("Cohere returned no generations".to_string()))
    }
}
