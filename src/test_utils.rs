//! Test utilities for Chronos Weaver
//!
//! Provides a scripted in-memory oracle, payload builders, and assertion
//! helpers shared by the unit tests.

use crate::error::Result;
use crate::oracle::{
    ChatMessage, ChoiceDescriptor, GeneratedImage, ImageResolution, Oracle, SessionContext,
    StoryPayload,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// A valid story payload with four options
pub fn sample_payload(story_text: &str) -> StoryPayload {
    StoryPayload {
        story_text: story_text.to_string(),
        inventory: vec!["torch".to_string()],
        current_quest: "Escape".to_string(),
        image_prompt: format!("scene: {}", story_text),
        options: sample_options(4),
    }
}

/// `n` distinct choices
pub fn sample_options(n: usize) -> Vec<ChoiceDescriptor> {
    (1..=n)
        .map(|i| ChoiceDescriptor::new(format!("Option {}", i), format!("Do thing {}", i)))
        .collect()
}

/// A tiny PNG-signed image
pub fn sample_image() -> GeneratedImage {
    GeneratedImage {
        mime_type: "image/png".to_string(),
        data: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0],
    }
}

/// Assert that an error's message contains `expected`
///
/// # Panics
///
/// Panics if the result is Ok or the message does not match
pub fn assert_error_contains<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
    match result {
        Ok(v) => panic!("Expected error containing '{}', got Ok({:?})", expected, v),
        Err(e) => assert!(
            e.to_string().contains(expected),
            "Expected error containing '{}', got '{}'",
            expected,
            e
        ),
    }
}

/// Oracle that replays queued responses
///
/// Empty queues answer with an error for story calls, `None` for images,
/// and an error for chat. Optional [`Notify`] gates hold a call open until
/// the test releases it.
#[derive(Default)]
pub struct ScriptedOracle {
    stories: Mutex<VecDeque<Result<StoryPayload>>>,
    images: Mutex<VecDeque<Result<Option<GeneratedImage>>>>,
    chats: Mutex<VecDeque<Result<String>>>,
    story_gate: Option<Arc<Notify>>,
    image_gate: Option<Arc<Notify>>,
    chat_gate: Option<Arc<Notify>>,
    story_calls: AtomicUsize,
    image_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    last_continuation: Mutex<Option<(SessionContext, String)>>,
    last_image_request: Mutex<Option<(String, String, ImageResolution)>>,
    last_chat: Mutex<Option<(String, Vec<ChatMessage>, String)>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every story call until `gate` is notified
    pub fn with_story_gate(mut self, gate: Arc<Notify>) -> Self {
        self.story_gate = Some(gate);
        self
    }

    /// Hold every image call until `gate` is notified
    pub fn with_image_gate(mut self, gate: Arc<Notify>) -> Self {
        self.image_gate = Some(gate);
        self
    }

    /// Hold every chat call until `gate` is notified
    pub fn with_chat_gate(mut self, gate: Arc<Notify>) -> Self {
        self.chat_gate = Some(gate);
        self
    }

    pub fn push_story(&self, response: Result<StoryPayload>) {
        self.stories.lock().unwrap().push_back(response);
    }

    pub fn push_image(&self, response: Result<Option<GeneratedImage>>) {
        self.images.lock().unwrap().push_back(response);
    }

    pub fn push_chat(&self, response: Result<String>) {
        self.chats.lock().unwrap().push_back(response);
    }

    pub fn story_calls(&self) -> usize {
        self.story_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn last_continuation(&self) -> Option<(SessionContext, String)> {
        self.last_continuation.lock().unwrap().clone()
    }

    pub fn last_image_request(&self) -> Option<(String, String, ImageResolution)> {
        self.last_image_request.lock().unwrap().clone()
    }

    pub fn last_chat(&self) -> Option<(String, Vec<ChatMessage>, String)> {
        self.last_chat.lock().unwrap().clone()
    }

    async fn next_story(&self) -> Result<StoryPayload> {
        self.story_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.story_gate {
            gate.notified().await;
        }
        self.stories
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted story response")))
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn begin_session(&self, _genre: &str, _visual_style: &str) -> Result<StoryPayload> {
        self.next_story().await
    }

    async fn continue_session(
        &self,
        context: &SessionContext,
        choice_text: &str,
    ) -> Result<StoryPayload> {
        *self.last_continuation.lock().unwrap() = Some((context.clone(), choice_text.to_string()));
        self.next_story().await
    }

    async fn generate_image(
        &self,
        image_prompt: &str,
        visual_style: &str,
        resolution: ImageResolution,
    ) -> Result<Option<GeneratedImage>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_image_request.lock().unwrap() = Some((
            image_prompt.to_string(),
            visual_style.to_string(),
            resolution,
        ));
        if let Some(gate) = &self.image_gate {
            gate.notified().await;
        }
        self.images.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    async fn chat(
        &self,
        message: &str,
        prior_messages: &[ChatMessage],
        context_summary: &str,
    ) -> Result<String> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_chat.lock().unwrap() = Some((
            message.to_string(),
            prior_messages.to_vec(),
            context_summary.to_string(),
        ));
        if let Some(gate) = &self.chat_gate {
            gate.notified().await;
        }
        self.chats
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted chat response")))
    }
}
