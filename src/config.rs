//! Configuration loading and management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Directory holding the project-local config
pub const CONFIG_DIR: &str = ".conduit";
/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Text generation provider
    #[serde(default)]
    pub text: TextConfig,

    /// Image generation provider and output
    #[serde(default)]
    pub image: ImageConfig,

    /// Interactive session settings
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from file or default locations
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(|| {
            // Try .conduit/config.toml in current directory
            let local = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);
            if local.exists() {
                return Some(local);
            }

            // Try ~/.conduit/config.toml
            dirs::home_dir().map(|h| h.join(CONFIG_DIR).join(CONFIG_FILE))
        });

        match config_path {
            Some(p) if p.exists() => Self::from_file(&p),
            Some(p) if path.is_some() => Err(Error::Config(format!(
                "Config file not found: {}",
                p.display()
            ))),
            _ => Ok(Config::default()),
        }
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Which text generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextProviderKind {
    /// Cohere generate API
    Cohere,
    /// OpenAI-compatible chat completions
    Openai,
    /// Offline backend that echoes prompts back
    Echo,
}

impl TextProviderKind {
    /// Environment variable consulted when no key is configured
    pub fn key_env(&self) -> Option<&'static str> {
        match self {
            TextProviderKind::Cohere => Some("COHERE_API_KEY"),
            TextProviderKind::Openai => Some("OPENAI_API_KEY"),
            TextProviderKind::Echo => None,
        }
    }
}

impl std::fmt::Display for TextProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextProviderKind::Cohere => write!(f, "cohere"),
            TextProviderKind::Openai => write!(f, "openai"),
            TextProviderKind::Echo => write!(f, "echo"),
        }
    }
}

/// Text provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Provider backend
    #[serde(default = "default_text_kind")]
    pub kind: TextProviderKind,

    /// Model name (provider default when unset)
    #[serde(default)]
    pub model: Option<String>,

    /// API base URL override
    #[serde(default)]
    pub api_base: Option<String>,

    /// API key (can also be in environment)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_text_kind() -> TextProviderKind {
    TextProviderKind::Cohere
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            kind: default_text_kind(),
            model: None,
            api_base: None,
            api_key: None,
            timeout: default_timeout(),
        }
    }
}

impl TextConfig {
    /// Configured key, else the provider's environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| self.kind.key_env().and_then(|var| std::env::var(var).ok()))
    }
}

/// Image provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// API base URL
    #[serde(default = "default_image_api_base")]
    pub api_base: String,

    /// Engine id used in the generation path
    #[serde(default = "default_engine")]
    pub engine: String,

    /// API key (can also be in STABILITY_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Directory generated images are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Prompt adherence
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f32,

    /// Diffusion steps
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_image_api_base() -> String {
    "https://api.stability.ai".to_string()
}

fn default_engine() -> String {
    "stable-diffusion-v1-6".to_string()
}

fn default_output_dir() -> String {
    "generated_images".to_string()
}

fn default_cfg_scale() -> f32 {
    7.0
}

fn default_steps() -> u32 {
    30
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_base: default_image_api_base(),
            engine: default_engine(),
            api_key: None,
            output_dir: default_output_dir(),
            cfg_scale: default_cfg_scale(),
            steps: default_steps(),
            timeout: default_timeout(),
        }
    }
}

impl ImageConfig {
    /// Configured key, else `STABILITY_API_KEY`
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("STABILITY_API_KEY").ok())
    }

    /// Output directory with `~` and environment variables expanded
    pub fn output_path(&self) -> PathBuf {
        match shellexpand::full(&self.output_dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(&self.output_dir),
        }
    }
}

/// Interactive session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Messages kept in the conversation store
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Times the image prompt may be regenerated after a rejection
    #[serde(default = "default_refinement_attempts")]
    pub refinement_attempts: u32,
}

fn default_max_history() -> usize {
    200
}

fn default_refinement_attempts() -> u32 {
    3
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            refinement_attempts: default_refinement_attempts(),
        }
    }
}

/// Initialize the .conduit directory in the current directory
pub fn init(force: bool) -> Result<PathBuf> {
    init_at(Path::new("."), force)
}

/// Initialize a .conduit directory under `root`, returning the config path
pub fn init_at(root: &Path, force: bool) -> Result<PathBuf> {
    let conduit_dir = root.join(CONFIG_DIR);
    if !conduit_dir.exists() {
        std::fs::create_dir_all(&conduit_dir)?;
    }

    let config_path = conduit_dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    std::fs::write(&config_path, Config::default().to_toml()?)?;
    Ok(config_path)
}

// Custom serde module for Duration using humantime
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.text.kind, TextProviderKind::Cohere);
        assert_eq!(config.text.timeout, Duration::from_secs(120));
        assert_eq!(config.image.engine, "stable-diffusion-v1-6");
        assert_eq!(config.image.steps, 30);
        assert_eq!(config.session.max_history, 200);
        assert_eq!(config.session.refinement_attempts, 3);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let toml = r#"
[text]
kind = "echo"
timeout = "30s"

[session]
refinement_attempts = 1
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.text.kind, TextProviderKind::Echo);
        assert_eq!(config.text.timeout, Duration::from_secs(30));
        assert_eq!(config.session.refinement_attempts, 1);
        assert_eq!(config.session.max_history, 200);
        assert_eq!(config.image.output_dir, "generated_images");
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let path = init_at(dir.path(), false).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.image.cfg_scale, 7.0);
        assert_eq!(loaded.image.timeout, Duration::from_secs(120));

        assert!(init_at(dir.path(), false).is_err());
        assert!(init_at(dir.path(), true).is_ok());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::load(Some(&missing)), Err(Error::Config(_))));
    }

    #[test]
    fn test_output_path_expands_home() {
        let config = ImageConfig {
            output_dir: "~/pictures".to_string(),
            ..ImageConfig::default()
        };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.output_path(), home.join("pictures"));
        }
    }
}
