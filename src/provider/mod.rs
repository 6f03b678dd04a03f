//! Generation providers used by stages
//!
//! Supports:
//! - Cohere generate API (text)
//! - OpenAI-compatible chat completions (text)
//! - Stability text-to-image (images)
//! - An offline echo backend (text only)

mod cohere;
mod echo;
mod openai;
mod stability;

pub use cohere::CohereGenerator;
pub use echo::{EchoGenerator, UnavailableImageGenerator};
pub use openai::OpenAiGenerator;
pub use stability::StabilityGenerator;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::config::{Config, TextProviderKind};
use crate::{Error, Result};

/// A single text generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    /// Request with the default temperature (0.7)
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: 0.7,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A single image generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

/// Produces text from a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

/// Produces images from a prompt
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Returns one encoded PNG per sample
    async fn generate(&self, request: ImageRequest) -> Result<Vec<Vec<u8>>>;
}

/// Build an HTTP client with a request timeout
pub(crate) fn http_client(
    headers: reqwest::header::HeaderMap,
    timeout: std::time::Duration,
) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Provider(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into a provider error
pub(crate) async fn check_status(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Provider(format!(
        "{} returned {}: {}",
        backend, status, body
    )))
}

/// Create the text generator named in the configuration
pub fn create_text_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    match config.text.kind {
        TextProviderKind::Cohere => Ok(Arc::new(CohereGenerator::new(&config.text)?)),
        TextProviderKind::Openai => Ok(Arc::new(OpenAiGenerator::new(&config.text)?)),
        TextProviderKind::Echo => Ok(Arc::new(EchoGenerator)),
    }
}

/// Create the image generator
///
/// Without a Stability key the image workflow still starts; generation then
/// fails inside the stage and is reported to the user.
pub fn create_image_generator(config: &Config) -> Result<Arc<dyn ImageGenerator>> {
    match config.image.resolved_api_key() {
        Some(key) => Ok(Arc::new(StabilityGenerator::new(&config.image, &key)?)),
        None => {
            warn!("No Stability API key configured; image generation is unavailable");
            Ok(Arc::new(UnavailableImageGenerator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_kind_needs_no_key() {
        let mut config = Config::default();
        config.text.kind = TextProviderKind::Echo;
        let generator = create_text_generator(&config).unwrap();
        assert_eq!(generator.name(), "echo");
    }

    #[test]
    fn test_request_builder() {
        let req = GenerationRequest::new("Detect the language", 50).temperature(0.3);
        assert_eq!(req.max_tokens, 50);
        assert_eq!(req.temperature, 0.3);
        assert_eq!(GenerationRequest::new("x", 1).temperature, 0.7);
    }
}
