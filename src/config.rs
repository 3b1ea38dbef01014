//! Configuration management for Chronos Weaver
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChronosError, Result};
use crate::oracle::ImageResolution;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Chronos Weaver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Oracle (generative service) settings
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Game presentation settings
    #[serde(default)]
    pub game: GameConfig,
    /// Companion chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Generative oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the Generative Language API
    ///
    /// Overridable so tests can point the oracle at a mock server.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used for opening and continuing the story
    #[serde(default = "default_story_model")]
    pub story_model: String,

    /// Model used for the companion chat
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for scene images
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Aspect ratio requested for scene images
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_story_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_chat_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_image_model() -> String {
    "gemini-3-pro-image-preview".to_string()
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            story_model: default_story_model(),
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            aspect_ratio: default_aspect_ratio(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Game presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Resolution used for scene images until changed in-game
    #[serde(default)]
    pub default_resolution: ImageResolution,

    /// Directory where generated scene images are written
    ///
    /// When unset, a `scenes` directory under the platform data dir is used.
    #[serde(default)]
    pub image_dir: Option<PathBuf>,

    /// Whether generated scene images are written to disk at all
    #[serde(default = "default_save_images")]
    pub save_images: bool,
}

fn default_save_images() -> bool {
    true
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_resolution: ImageResolution::default(),
            image_dir: None,
            save_images: default_save_images(),
        }
    }
}

impl GameConfig {
    /// Resolve the directory used for saved scene images
    pub fn resolved_image_dir(&self) -> PathBuf {
        if let Some(dir) = &self.image_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "chronos-weaver")
            .map(|dirs| dirs.data_dir().join("scenes"))
            .unwrap_or_else(|| PathBuf::from("scenes"))
    }
}

/// Companion chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Reply shown when the companion answers with empty text
    #[serde(default = "default_silent_reply")]
    pub silent_reply: String,

    /// Reply shown when the chat call fails
    #[serde(default = "default_error_reply")]
    pub error_reply: String,

    /// Maximum length of a single user chat message (characters)
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_silent_reply() -> String {
    "I seem to have lost my train of thought...".to_string()
}

fn default_error_reply() -> String {
    "An error occurred in the magical ether.".to_string()
}

fn default_max_message_chars() -> usize {
    2000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            silent_reply: default_silent_reply(),
            error_reply: default_error_reply(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChronosError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChronosError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_base) = std::env::var("CHRONOS_API_BASE") {
            self.oracle.api_base = api_base;
        }

        if let Ok(model) = std::env::var("CHRONOS_STORY_MODEL") {
            self.oracle.story_model = model;
        }

        if let Ok(model) = std::env::var("CHRONOS_CHAT_MODEL") {
            self.oracle.chat_model = model;
        }

        if let Ok(model) = std::env::var("CHRONOS_IMAGE_MODEL") {
            self.oracle.image_model = model;
        }

        if let Ok(timeout) = std::env::var("CHRONOS_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.oracle.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CHRONOS_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(resolution) = std::env::var("CHRONOS_RESOLUTION") {
            match resolution.parse() {
                Ok(value) => self.game.default_resolution = value,
                Err(e) => tracing::warn!("Invalid CHRONOS_RESOLUTION: {}", e),
            }
        }

        if let Ok(dir) = std::env::var("CHRONOS_IMAGE_DIR") {
            self.game.image_dir = Some(PathBuf::from(dir));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let crate::cli::Commands::Play {
            resolution: Some(resolution),
            ..
        } = &cli.command
        {
            self.game.default_resolution = *resolution;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.oracle.api_base).is_err() {
            return Err(ChronosError::Config(format!(
                "oracle.api_base is not a valid URL: {}",
                self.oracle.api_base
            ))
            .into());
        }

        for (field, value) in [
            ("oracle.story_model", &self.oracle.story_model),
            ("oracle.chat_model", &self.oracle.chat_model),
            ("oracle.image_model", &self.oracle.image_model),
            ("oracle.aspect_ratio", &self.oracle.aspect_ratio),
        ] {
            if value.trim().is_empty() {
                return Err(ChronosError::Config(format!("{} cannot be empty", field)).into());
            }
        }

        if self.oracle.timeout_seconds == 0 || self.oracle.timeout_seconds > 600 {
            return Err(ChronosError::Config(
                "oracle.timeout_seconds must be between 1 and 600".to_string(),
            )
            .into());
        }

        if self.chat.silent_reply.trim().is_empty() || self.chat.error_reply.trim().is_empty() {
            return Err(ChronosError::Config(
                "chat.silent_reply and chat.error_reply cannot be empty".to_string(),
            )
            .into());
        }

        if self.chat.max_message_chars == 0 {
            return Err(ChronosError::Config(
                "chat.max_message_chars must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
