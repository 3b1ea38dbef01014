//! Base oracle trait and common types for Chronos Weaver
//!
//! This module defines the [`Oracle`] trait every story/image backend must
//! implement, along with the payload and message types that cross the
//! oracle boundary.

use crate::error::{ChronosError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of choices every story response must carry
pub const CHOICE_COUNT: usize = 4;

/// Number of trailing history entries sent with a continuation request
pub const RECENT_HISTORY_LEN: usize = 3;

/// One selectable next step offered by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDescriptor {
    /// Short label shown on the choice
    pub label: String,
    /// Longer description of what the choice means
    pub description: String,
}

impl ChoiceDescriptor {
    /// Creates a new choice
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }

    /// Free-text form sent back to the oracle when this choice is taken
    ///
    /// # Examples
    ///
    /// ```
    /// use chronos_weaver::oracle::ChoiceDescriptor;
    ///
    /// let choice = ChoiceDescriptor::new("Climb", "Scale the crypt wall");
    /// assert_eq!(choice.choice_text(), "Climb: Scale the crypt wall");
    /// ```
    pub fn choice_text(&self) -> String {
        format!("{}: {}", self.label, self.description)
    }
}

/// Story response returned by the opening and continuation calls
///
/// Field names follow the oracle's JSON contract (camelCase on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPayload {
    /// Narrative text of the new scene
    pub story_text: String,
    /// Complete inventory after the scene
    pub inventory: Vec<String>,
    /// Current quest, possibly empty
    pub current_quest: String,
    /// Prompt for the scene image
    pub image_prompt: String,
    /// Exactly [`CHOICE_COUNT`] next steps
    pub options: Vec<ChoiceDescriptor>,
}

impl StoryPayload {
    /// Parse and validate a story payload from oracle JSON text
    ///
    /// # Errors
    ///
    /// Returns [`ChronosError::MalformedPayload`] when the text is empty, is not
    /// JSON, misses a required field, or fails [`StoryPayload::validate`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chronos_weaver::oracle::StoryPayload;
    ///
    /// let json = r#"{"storyText":"A door.","inventory":[],"currentQuest":"",
    ///   "imagePrompt":"door","options":[{"label":"a","description":"1"}]}"#;
    /// assert!(StoryPayload::from_json(json).is_err());
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(ChronosError::MalformedPayload("empty story response".to_string()).into());
        }
        let payload: StoryPayload = serde_json::from_str(text)
            .map_err(|e| ChronosError::MalformedPayload(format!("invalid story JSON: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Check the payload against the story contract
    ///
    /// # Errors
    ///
    /// Returns [`ChronosError::MalformedPayload`] if the story text is blank,
    /// the option count is not [`CHOICE_COUNT`], or an option has a blank label.
    pub fn validate(&self) -> Result<()> {
        if self.story_text.trim().is_empty() {
            return Err(ChronosError::MalformedPayload("storyText is empty".to_string()).into());
        }

        if self.options.len() != CHOICE_COUNT {
            return Err(ChronosError::MalformedPayload(format!(
                "expected {} options, got {}",
                CHOICE_COUNT,
                self.options.len()
            ))
            .into());
        }

        if let Some(idx) = self.options.iter().position(|o| o.label.trim().is_empty()) {
            return Err(
                ChronosError::MalformedPayload(format!("option {} has an empty label", idx + 1))
                    .into(),
            );
        }

        Ok(())
    }
}

/// Session facts sent along with a continuation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Quest at the time of the choice
    pub current_quest: String,
    /// Inventory at the time of the choice
    pub inventory: Vec<String>,
    /// Up to [`RECENT_HISTORY_LEN`] most recent story texts, oldest first
    pub recent_history: Vec<String>,
    /// Visual style fixed at session start
    pub visual_style: String,
}

/// Image resolution requested from the oracle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageResolution {
    /// 1K output
    #[default]
    #[serde(rename = "1K")]
    R1K,
    /// 2K output
    #[serde(rename = "2K")]
    R2K,
    /// 4K output
    #[serde(rename = "4K")]
    R4K,
}

impl ImageResolution {
    /// All selectable resolutions in display order
    pub const ALL: [ImageResolution; 3] = [Self::R1K, Self::R2K, Self::R4K];

    /// Wire value for the oracle's `imageSize` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::R1K => "1K",
            Self::R2K => "2K",
            Self::R4K => "4K",
        }
    }
}

impl fmt::Display for ImageResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageResolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1K" => Ok(Self::R1K),
            "2K" => Ok(Self::R2K),
            "4K" => Ok(Self::R4K),
            other => Err(format!("Unknown resolution: {} (expected 1K, 2K or 4K)", other)),
        }
    }
}

/// Decoded scene image returned by the oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// MIME type reported by the oracle
    pub mime_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

impl GeneratedImage {
    /// Sniff the actual image format from the bytes
    pub fn format(&self) -> Option<image::ImageFormat> {
        image::guess_format(&self.data).ok()
    }

    /// File extension for saving the image, falling back to `png`
    pub fn extension(&self) -> &'static str {
        self.format()
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("png")
    }
}

/// Author of a companion chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The player
    User,
    /// The companion persona
    Companion,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "You"),
            Self::Companion => write!(f, "Chronicler"),
        }
    }
}

/// One entry in the companion chat log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Creates a player message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates a companion message
    pub fn companion(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Companion,
            content: content.into(),
        }
    }
}

/// Oracle trait for story and image backends
///
/// Every call is a single request/response exchange with no retry,
/// streaming, or partial result. Implementations hold no session state.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use chronos_weaver::error::Result;
/// use chronos_weaver::oracle::{
///     ChatMessage, GeneratedImage, ImageResolution, Oracle, SessionContext, StoryPayload,
/// };
///
/// struct Silent;
///
/// #[async_trait]
/// impl Oracle for Silent {
///     async fn begin_session(&self, _genre: &str, _style: &str) -> Result<StoryPayload> {
///         anyhow::bail!("no story today")
///     }
///     async fn continue_session(&self, _ctx: &SessionContext, _choice: &str) -> Result<StoryPayload> {
///         anyhow::bail!("no story today")
///     }
///     async fn generate_image(
///         &self,
///         _prompt: &str,
///         _style: &str,
///         _resolution: ImageResolution,
///     ) -> Result<Option<GeneratedImage>> {
///         Ok(None)
///     }
///     async fn chat(&self, _msg: &str, _prior: &[ChatMessage], _ctx: &str) -> Result<String> {
///         Ok(String::new())
///     }
/// }
/// ```
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate the opening scene for a new session
    async fn begin_session(&self, genre: &str, visual_style: &str) -> Result<StoryPayload>;

    /// Generate the next scene after the player picks a choice
    async fn continue_session(
        &self,
        context: &SessionContext,
        choice_text: &str,
    ) -> Result<StoryPayload>;

    /// Generate the scene image
    ///
    /// Returns `Ok(None)` when no image could be produced. The only error a
    /// well-behaved backend returns is [`ChronosError::CredentialInvalidated`].
    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
        resolution: ImageResolution,
    ) -> Result<Option<GeneratedImage>>;

    /// Ask the companion a question
    ///
    /// `prior_messages` is the full log before `message`; the oracle keeps
    /// no conversation memory between calls.
    async fn chat(
        &self,
        message: &str,
        prior_messages: &[ChatMessage],
        context_summary: &str,
    ) -> Result<String>;
}
