//! Image workflow: prompt enhancer → image creator

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::images::ImageStore;
use crate::interactive::{require_line, Prompter};
use crate::pipeline::{ArtifactKey, ImageArtifact, ImageParams, Stage, StageId, StateRecord};
use crate::provider::{GenerationRequest, ImageGenerator, ImageRequest, TextGenerator};
use crate::Result;

const ENHANCE_MAX_TOKENS: u32 = 300;

/// One questionnaire entry
struct Question {
    label: &'static str,
    text: &'static str,
    options: &'static [&'static str],
}

const STYLE: &str = "Style";

const QUESTIONS: &[Question] = &[
    Question {
        label: STYLE,
        text: "What style would you like for the image?",
        options: &[
            "Photorealistic",
            "Digital Art",
            "Oil Painting",
            "Watercolor",
            "Anime/Manga",
            "3D Rendered",
            "Sketch",
            "Other (please specify)",
        ],
    },
    Question {
        label: "Mood",
        text: "What mood or atmosphere should the image convey?",
        options: &[
            "Bright and Cheerful",
            "Dark and Moody",
            "Peaceful/Serene",
            "Dramatic",
            "Mysterious",
            "Other (please specify)",
        ],
    },
    Question {
        label: "Colors",
        text: "Any specific color palette preferences?",
        options: &[
            "Warm Colors",
            "Cool Colors",
            "Monochromatic",
            "Vibrant/Colorful",
            "Pastel",
            "Other (please specify)",
        ],
    },
    Question {
        label: "Perspective",
        text: "What should be the main focus or perspective?",
        options: &[
            "Close-up",
            "Wide Shot",
            "Bird's Eye View",
            "First Person",
            "Other (please specify)",
        ],
    },
];

/// Refines the user's concept into a detailed image prompt
///
/// Asks about style, mood, colors and perspective, generates a prompt and
/// asks the user to confirm it. A rejected prompt starts the questionnaire
/// again, up to `attempts` generations; after that the last candidate is used.
pub struct PromptEnhancer {
    text: Arc<dyn TextGenerator>,
    console: Arc<dyn Prompter>,
    attempts: u32,
}

impl PromptEnhancer {
    pub fn new(text: Arc<dyn TextGenerator>, console: Arc<dyn Prompter>, attempts: u32) -> Self {
        Self {
            text,
            console,
            attempts: attempts.max(1),
        }
    }

    async fn ask(&self, question: &Question) -> Result<String> {
        self.console.say(&format!("\n{}", question.text));
        for (i, option) in question.options.iter().enumerate() {
            self.console.say(&format!("{}. {}", i + 1, option));
        }

        loop {
            let choice = require_line(self.console.as_ref(), "\nEnter your choice (number): ").await?;
            let selected = choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| question.options.get(i));

            match selected {
                Some(option) if option.starts_with("Other") => {
                    return require_line(self.console.as_ref(), "Please specify: ").await;
                }
                Some(option) => return Ok(option.to_string()),
                None => self.console.say("Please enter a valid number"),
            }
        }
    }

    async fn preferences(&self, style_hint: Option<&str>) -> Result<Vec<(&'static str, String)>> {
        let mut answers = Vec::with_capacity(QUESTIONS.len());
        for question in QUESTIONS {
            let answer = match style_hint {
                Some(style) if question.label == STYLE => {
                    self.console.say(&format!("\nStyle: {} (from your request)", style));
                    style.to_string()
                }
                _ => self.ask(question).await?,
            };
            answers.push((question.label, answer));
        }
        Ok(answers)
    }

    async fn confirm(&self) -> Result<bool> {
        loop {
            let answer = require_line(
                self.console.as_ref(),
                "\nWould you like to proceed with this prompt? (yes/no): ",
            )
            .await?
            .to_lowercase();

            match answer.as_str() {
                "yes" | "y" => return Ok(true),
                "no" | "n" => return Ok(false),
                _ => self.console.say("Please enter 'yes' or 'no'"),
            }
        }
    }
}

fn enhancement_prompt(concept: &str, answers: &[(&str, String)], details: &str) -> String {
    let mut prompt = format!("Original concept: {}\n", concept);
    for (label, answer) in answers {
        prompt.push_str(&format!("{}: {}\n", label, answer));
    }
    prompt.push_str(&format!(
        "Additional details: {}\n\n\
         Based on these preferences, create a detailed and creative image generation prompt.\n\
         Focus on creating a cohesive and vivid description that incorporates all the specified elements.\n\
         Make it detailed but keep it concise and clear.",
        if details.is_empty() { "None" } else { details }
    ));
    prompt
}

#[async_trait]
impl Stage for PromptEnhancer {
    fn id(&self) -> StageId {
        StageId::PromptEnhancer
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::EnhancedPrompt]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let concept = state.last_user_text().to_string();
        let style_hint = state.parameters.image().and_then(|p| p.style.clone());

        if concept.trim().is_empty() {
            state.degrade(
                self.id(),
                "Please describe the image you want, e.g. a lighthouse at dusk style:watercolor samples:2",
                "empty input",
            );
            return Ok(state);
        }

        self.console.say("\nLet's refine your image concept!");
        self.console.say(&format!("Initial concept: {}", concept));

        let mut last_candidate = None;
        for attempt in 1..=self.attempts {
            let answers = self.preferences(style_hint.as_deref()).await?;
            let details = require_line(
                self.console.as_ref(),
                "\nAny additional details you'd like to add? (press Enter to skip): ",
            )
            .await?;

            let prompt = enhancement_prompt(&concept, &answers, &details);
            let enhanced = match self
                .text
                .generate(GenerationRequest::new(prompt, ENHANCE_MAX_TOKENS))
                .await
            {
                Ok(enhanced) => enhanced,
                Err(e) => {
                    warn!("Prompt enhancement failed: {}", e);
                    state.artifacts.enhanced_prompt = Some(concept);
                    state.degrade(
                        self.id(),
                        "I couldn't enhance the prompt, so I'll use your original description.",
                        &e.to_string(),
                    );
                    return Ok(state);
                }
            };

            self.console.say("\nEnhanced Prompt:");
            self.console.say(&enhanced);

            if self.confirm().await? {
                state.artifacts.enhanced_prompt = Some(enhanced);
                return Ok(state);
            }

            last_candidate = Some(enhanced);
            if attempt < self.attempts {
                self.console.say("\nLet's try again!");
            }
        }

        info!("Prompt rejected {} times, using last candidate", self.attempts);
        state.say(format!(
            "You rejected the suggested prompt {} times, so I used the last one. \
             Send a new description to start over.",
            self.attempts
        ));
        state.artifacts.enhanced_prompt = Some(last_candidate.unwrap_or(concept));
        Ok(state)
    }
}

/// Generates images from the enhanced prompt and saves them
pub struct ImageCreator {
    image: Arc<dyn ImageGenerator>,
    store: Arc<ImageStore>,
}

impl ImageCreator {
    pub fn new(image: Arc<dyn ImageGenerator>, store: Arc<ImageStore>) -> Self {
        Self { image, store }
    }

    async fn create(&self, prompt: &str, params: &ImageParams) -> Result<Saved> {
        let images = self
            .image
            .generate(ImageRequest {
                prompt: prompt.to_string(),
                width: params.width,
                height: params.height,
                samples: params.samples,
            })
            .await?;

        let mut paths = Vec::with_capacity(images.len());
        for bytes in &images {
            match self.store.save(bytes).await {
                Ok(path) => paths.push(path.display().to_string()),
                Err(e) => {
                    return Ok(Saved {
                        paths,
                        total: images.len(),
                        error: Some(e),
                    })
                }
            }
        }
        Ok(Saved {
            paths,
            total: images.len(),
            error: None,
        })
    }
}

/// Outcome of saving one batch of generated images
struct Saved {
    paths: Vec<String>,
    total: usize,
    /// Set when a save failed; later images were not written
    error: Option<crate::Error>,
}

#[async_trait]
impl Stage for ImageCreator {
    fn id(&self) -> StageId {
        StageId::ImageGenerator
    }

    fn reads(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::EnhancedPrompt]
    }

    fn writes(&self) -> &'static [ArtifactKey] {
        &[ArtifactKey::GeneratedImages]
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        let prompt = state
            .artifacts
            .enhanced_prompt
            .clone()
            .unwrap_or_else(|| state.last_user_text().to_string());
        let params = state.parameters.image().cloned().unwrap_or_default();

        // Nothing to draw; the enhancer already asked for a description
        if prompt.trim().is_empty() {
            return Ok(state);
        }

        match self.create(&prompt, &params).await {
            Ok(Saved {
                paths,
                error: None,
                ..
            }) => {
                let message = match paths.as_slice() {
                    [single] => format!(
                        "Image generated and saved as: {}\nPrompt used: {}",
                        single, prompt
                    ),
                    many => format!(
                        "{} images generated and saved as:\n{}\nPrompt used: {}",
                        many.len(),
                        many.join("\n"),
                        prompt
                    ),
                };
                state.say(message);
                state.artifacts.images = Some(ImageArtifact { paths, prompt });
            }
            Ok(Saved {
                paths,
                total,
                error: Some(e),
            }) if !paths.is_empty() => {
                warn!("Saved {} of {} images: {}", paths.len(), total, e);
                let message = format!(
                    "Only {} of {} images could be saved:\n{}\nPrompt used: {}\n\
                     The rest failed: {}",
                    paths.len(),
                    total,
                    paths.join("\n"),
                    prompt,
                    e
                );
                state.artifacts.images = Some(ImageArtifact { paths, prompt });
                state.degrade(self.id(), message, &e.to_string());
            }
            Ok(Saved { error: Some(e), .. }) | Err(e) => {
                warn!("Image generation failed: {}", e);
                state.degrade(
                    self.id(),
                    format!(
                        "Sorry, I encountered an error while generating the image: {}",
                        e
                    ),
                    &e.to_string(),
                );
            }
        }
        Ok(state)
    }
}
