//! Stage implementations for the built-in workflows
//!
//! Each stage turns provider failures into a degraded state with a message
//! for the user; only console failures (closed input) escape as errors.

mod code;
mod grammar;
mod image;
mod output;
mod research;
mod summarizer;
mod translator;

pub use code::{detect_language, extract_code_blocks, CodeExplainer};
pub use grammar::GrammarChecker;
pub use image::{ImageCreator, PromptEnhancer};
pub use output::OutputStage;
pub use research::{Analyzer, Researcher, Writer};
pub use summarizer::Summarizer;
pub use translator::Translator;

use std::sync::Arc;

use crate::images::ImageStore;
use crate::interactive::Prompter;
use crate::provider::{ImageGenerator, TextGenerator};

/// Collaborators shared by the stages
#[derive(Clone)]
pub struct StageDeps {
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub images: Arc<ImageStore>,
    pub console: Arc<dyn Prompter>,
    /// Prompt generations allowed before the last candidate is accepted
    pub refinement_attempts: u32,
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes for stage and session tests

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::provider::{GenerationRequest, ImageGenerator, ImageRequest, TextGenerator};
    use crate::{Error, Result};

    type Reply = Box<dyn Fn(&GenerationRequest) -> Result<String> + Send + Sync>;

    /// Text generator driven by a closure, recording every request
    pub struct FakeText {
        reply: Reply,
        pub requests: Mutex<Vec<GenerationRequest>>,
    }

    impl FakeText {
        pub fn new(
            reply: impl Fn(&GenerationRequest) -> Result<String> + Send + Sync + 'static,
        ) -> Self {
            Self {
                reply: Box::new(reply),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Always answers with the same text
        pub fn constant(text: &'static str) -> Self {
            Self::new(move |_| Ok(text.to_string()))
        }

        /// Always fails
        pub fn failing() -> Self {
            Self::new(|_| Err(Error::Provider("service unavailable".to_string())))
        }

        pub fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeText {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(&self, request: GenerationRequest) -> Result<String> {
            let reply = (self.reply)(&request);
            self.requests.lock().unwrap().push(request);
            reply
        }
    }

    /// Image generator returning fixed bytes per sample
    pub struct FakeImages {
        pub requests: Mutex<Vec<ImageRequest>>,
        pub fail: bool,
    }

    impl FakeImages {
        pub fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for FakeImages {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(&self, request: ImageRequest) -> Result<Vec<Vec<u8>>> {
            let samples = request.samples;
            self.requests.lock().unwrap().push(request);
            if self.fail {
                return Err(Error::Provider("invalid_dimensions".to_string()));
            }
            Ok((0..samples).map(|i| vec![i as u8]).collect())
        }
    }
}
