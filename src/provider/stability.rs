//! Stability text-to-image API

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, http_client, ImageGenerator, ImageRequest};
use crate::config::ImageConfig;
use crate::{Error, Result};

/// Image generator backed by `/v1/generation/<engine>/text-to-image`
pub struct StabilityGenerator {
    url: String,
    cfg_scale: f32,
    steps: u32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct TextToImageBody<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: f32,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: String,
}

impl StabilityGenerator {
    pub fn new(config: &ImageConfig, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?,
        );

        Ok(Self {
            url: format!(
                "{}/v1/generation/{}/text-to-image",
                config.api_base.trim_end_matches('/'),
                config.engine
            ),
            cfg_scale: config.cfg_scale,
            steps: config.steps,
            client: http_client(headers, config.timeout)?,
        })
    }
}

#[async_trait]
impl ImageGenerator for StabilityGenerator {
    fn name(&self) -> &str {
        "stability"
    }

    async fn generate(&self, request: ImageRequest) -> Result<Vec<Vec<u8>>> {
        debug!(
            "POST {} {}x{} samples={}",
            self.url, request.width, request.height, request.samples
        );

        let body = TextToImageBody {
            text_prompts: vec![TextPrompt {
                text: &request.prompt,
            }],
            cfg_scale: self.cfg_scale,
            height: request.height,
            width: request.width,
            samples: request.samples,
            steps: self.steps,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        let response = check_status("Stability", response).await?;
        let parsed: TextToImageResponse = response.json().await?;

        if parsed.artifacts.is_empty() {
            return Err(Error::Provider("Stability returned no images".to_string()));
        }

        parsed
            .artifacts
            .iter()
            .map(|a| {
                BASE64
                    .decode(&a.base64)
                    .map_err(|e| Error::Provider(format!("Invalid image data: {}", e)))
            })
            .collect()
    }
}
