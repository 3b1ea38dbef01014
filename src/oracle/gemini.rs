//! Gemini oracle implementation for Chronos Weaver
//!
//! This module implements the Oracle trait on top of the Generative Language
//! REST API (`models/{model}:generateContent`). Story calls request JSON output
//! constrained by a response schema; image calls read base64 `inlineData`
//! parts. The API key is fetched from the credential provider before every
//! call so a freshly selected key takes effect immediately.

use crate::config::OracleConfig;
use crate::credentials::CredentialProvider;
use crate::error::{ChronosError, Result};
use crate::oracle::{
    ChatMessage, ChatRole, GeneratedImage, ImageResolution, Oracle, SessionContext, StoryPayload,
};
use crate::prompts;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Error text the API returns when the key's project or entity is gone
pub const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// Gemini API oracle
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chronos_weaver::config::OracleConfig;
/// use chronos_weaver::credentials::KeyringCredentialProvider;
/// use chronos_weaver::oracle::{GeminiOracle, Oracle};
///
/// # async fn example() -> chronos_weaver::error::Result<()> {
/// let credentials = Arc::new(KeyringCredentialProvider::new());
/// let oracle = GeminiOracle::new(OracleConfig::default(), credentials)?;
/// let opening = oracle.begin_session("Dark Fantasy", "Oil Painting").await?;
/// println!("{}", opening.story_text);
/// # Ok(())
/// # }
/// ```
pub struct GeminiOracle {
    client: Client,
    config: OracleConfig,
    credentials: Arc<dyn CredentialProvider>,
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// A turn of content (request or response)
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// One part of a content turn
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

/// Base64 binary payload inside a part
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

/// Generation settings
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

/// Image generation settings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
    image_size: String,
}

/// Response body from `generateContent`
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: Some(text.into()),
                inline_data: None,
            }],
        }
    }
}

impl GenerateContentResponse {
    /// Parts of the first candidate
    fn parts(&self) -> &[GeminiPart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .concat()
    }

    /// First inline binary part of the first candidate
    fn inline_data(&self) -> Option<&InlineData> {
        self.parts().iter().find_map(|p| p.inline_data.as_ref())
    }
}

/// JSON schema the story model must answer with
fn story_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "storyText": { "type": "STRING" },
            "inventory": { "type": "ARRAY", "items": { "type": "STRING" } },
            "currentQuest": { "type": "STRING" },
            "imagePrompt": {
                "type": "STRING",
                "description": "A detailed prompt for an image generator based on the scene"
            },
            "options": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["label", "description"]
                }
            }
        },
        "required": ["storyText", "inventory", "currentQuest", "imagePrompt", "options"]
    })
}

/// Map a non-success response to an oracle error
fn format_gemini_api_error(status: reqwest::StatusCode, body: &str) -> ChronosError {
    let detail = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| {
            if e.error.status.is_empty() {
                e.error.message
            } else {
                format!("{} ({})", e.error.message, e.error.status)
            }
        })
        .unwrap_or_else(|_| body.to_string());

    ChronosError::Oracle(format!("Gemini returned error {}: {}", status, detail))
}

impl GeminiOracle {
    /// Create a new Gemini oracle
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OracleConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chronos-weaver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChronosError::Oracle(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Gemini oracle: story_model={}, image_model={}",
            config.story_model,
            config.image_model
        );

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// Build the `generateContent` URL for a model
    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let api_key = self.credentials.api_key().await?.ok_or_else(|| {
            ChronosError::MissingCredentials("no API key available".to_string())
        })?;

        tracing::debug!(
            "Sending Gemini request: model={}, {} contents",
            model,
            request.contents.len()
        );

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request failed: {}", e);
                ChronosError::Oracle(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned error {}: {}", status, body);
            return Err(format_gemini_api_error(status, &body).into());
        }

        response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ChronosError::Oracle(format!("Failed to parse Gemini response: {}", e)).into()
        })
    }

    /// Run a story call and parse the structured payload
    async fn story_call(&self, prompt: String) -> Result<StoryPayload> {
        let request = GenerateContentRequest {
            contents: vec![GeminiContent::text(Some("user"), prompt)],
            system_instruction: Some(GeminiContent::text(None, prompts::STORY_SYSTEM_PROMPT)),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(story_response_schema()),
                image_config: None,
            }),
        };

        let response = self
            .generate_content(&self.config.story_model, &request)
            .await?;
        StoryPayload::from_json(&response.text())
    }

    async fn image_call(
        &self,
        prompt: String,
        resolution: ImageResolution,
    ) -> Result<Option<GeneratedImage>> {
        let request = GenerateContentRequest {
            contents: vec![GeminiContent::text(Some("user"), prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: self.config.aspect_ratio.clone(),
                    image_size: resolution.as_str().to_string(),
                }),
                ..Default::default()
            }),
        };

        let response = self
            .generate_content(&self.config.image_model, &request)
            .await?;

        let Some(inline) = response.inline_data() else {
            tracing::debug!("Gemini image response carried no inline data");
            return Ok(None);
        };

        let data = base64::engine::general_purpose::STANDARD
            .decode(inline.data.trim())
            .map_err(|e| ChronosError::MalformedPayload(format!("invalid image data: {}", e)))?;

        let mime_type = if inline.mime_type.is_empty() {
            "image/png".to_string()
        } else {
            inline.mime_type.clone()
        };

        Ok(Some(GeneratedImage { mime_type, data }))
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn begin_session(&self, genre: &str, visual_style: &str) -> Result<StoryPayload> {
        tracing::info!("Opening adventure: genre={}, style={}", genre, visual_style);
        self.story_call(prompts::build_opening_prompt(genre, visual_style))
            .await
    }

    async fn continue_session(
        &self,
        context: &SessionContext,
        choice_text: &str,
    ) -> Result<StoryPayload> {
        self.story_call(prompts::build_continuation_prompt(context, choice_text))
            .await
    }

    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
        resolution: ImageResolution,
    ) -> Result<Option<GeneratedImage>> {
        let prompt = prompts::build_image_prompt(image_prompt, visual_style);

        match self.image_call(prompt, resolution).await {
            Ok(image) => Ok(image),
            Err(e) if e.to_string().contains(ENTITY_NOT_FOUND) => {
                tracing::error!("Image generation rejected the credential: {}", e);
                Err(ChronosError::CredentialInvalidated.into())
            }
            Err(e) => {
                tracing::warn!("Image generation error: {}", e);
                Ok(None)
            }
        }
    }

    async fn chat(
        &self,
        message: &str,
        prior_messages: &[ChatMessage],
        context_summary: &str,
    ) -> Result<String> {
        let mut contents: Vec<GeminiContent> = prior_messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    ChatRole::User => "user",
                    ChatRole::Companion => "model",
                };
                GeminiContent::text(Some(role), m.content.clone())
            })
            .collect();
        contents.push(GeminiContent::text(Some("user"), message));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(GeminiContent::text(
                None,
                prompts::build_companion_prompt(context_summary),
            )),
            generation_config: None,
        };

        let response = self
            .generate_content(&self.config.chat_model, &request)
            .await?;
        Ok(response.text())
    }
}
