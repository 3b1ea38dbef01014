//! Credential-gated oracle wrapper
//!
//! Every call first requires the gate to be passed. A
//! `CredentialInvalidated` error flowing back from the inner oracle revokes
//! the gate before it reaches the caller.

use crate::credentials::CredentialGate;
use crate::error::{is_credential_invalidated, Result};
use crate::oracle::{
    ChatMessage, GeneratedImage, ImageResolution, Oracle, SessionContext, StoryPayload,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Oracle guarded by a [`CredentialGate`]
pub struct GatedOracle {
    inner: Arc<dyn Oracle>,
    gate: Arc<CredentialGate>,
}

impl GatedOracle {
    /// Wrap `inner` behind `gate`
    pub fn new(inner: Arc<dyn Oracle>, gate: Arc<CredentialGate>) -> Self {
        Self { inner, gate }
    }

    /// The gate guarding this oracle
    pub fn gate(&self) -> &Arc<CredentialGate> {
        &self.gate
    }

    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if is_credential_invalidated(e) {
                self.gate.revoke();
            }
        }
        result
    }
}

#[async_trait]
impl Oracle for GatedOracle {
    async fn begin_session(&self, genre: &str, visual_style: &str) -> Result<StoryPayload> {
        self.gate.ensure_passed()?;
        let result = self.inner.begin_session(genre, visual_style).await;
        self.observe(result)
    }

    async fn continue_session(
        &self,
        context: &SessionContext,
        choice_text: &str,
    ) -> Result<StoryPayload> {
        self.gate.ensure_passed()?;
        let result = self.inner.continue_session(context, choice_text).await;
        self.observe(result)
    }

    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
        resolution: ImageResolution,
    ) -> Result<Option<GeneratedImage>> {
        self.gate.ensure_passed()?;
        let result = self
            .inner
            .generate_image(image_prompt, visual_style, resolution)
            .await;
        self.observe(result)
    }

    async fn chat(
        &self,
        message: &str,
        prior_messages: &[ChatMessage],
        context_summary: &str,
    ) -> Result<String> {
        self.gate.ensure_passed()?;
        let result = self
            .inner
            .chat(message, prior_messages, context_summary)
            .await;
        self.observe(result)
    }
}
