//! Offline backends

use async_trait::async_trait;

use super::{GenerationRequest, ImageGenerator, ImageRequest, TextGenerator};
use crate::{Error, Result};

/// Returns the last line of the prompt; useful without network access
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let last = request
            .prompt
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("");
        Ok(format!("[echo] {}", last.trim()))
    }
}

/// Image backend used when no image provider is configured
pub struct UnavailableImageGenerator;

#[async_trait]
impl ImageGenerator for UnavailableImageGenerator {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn generate(&self, _request: ImageRequest) -> Result<Vec<Vec<u8>>> {
        Err(Error::Provider(
            "no image provider configured (set STABILITY_API_KEY)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_last_line() {
        let text = EchoGenerator
            .generate(GenerationRequest::new("Translate this:\nhola\n\n", 10))
            .await
            .unwrap();
        assert_eq!(text, "[echo] hola");
    }

    #[tokio::test]
    async fn test_unavailable_image_backend_errors() {
        let result = UnavailableImageGenerator
            .generate(ImageRequest {
                prompt: "cat".to_string(),
                width: 512,
                height: 512,
                samples: 1,
            })
            .await;
        assert!(matches!(result, Err(Error::Provider(_))));
    }
}
