//! Authoritative game state
//!
//! A [`Session`] is never edited in place. Each successful story response
//! produces a fresh value through [`Session::advance`], which replaces the
//! scene fields wholesale and appends one history entry.

use crate::error::Result;
use crate::oracle::{ChoiceDescriptor, SessionContext, StoryPayload, RECENT_HISTORY_LEN};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The single current game state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    genre: String,
    visual_style: String,
    story_text: String,
    inventory: Vec<String>,
    current_quest: String,
    image_prompt: String,
    options: Vec<ChoiceDescriptor>,
    history: Vec<String>,
}

impl Session {
    /// Create a session from the opening scene
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the payload does not describe a full scene
    pub fn open(genre: &str, visual_style: &str, payload: StoryPayload) -> Result<Self> {
        payload.validate()?;

        let StoryPayload {
            story_text,
            inventory,
            current_quest,
            image_prompt,
            options,
        } = payload;

        Ok(Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            genre: genre.to_string(),
            visual_style: visual_style.to_string(),
            history: vec![story_text.clone()],
            story_text,
            inventory,
            current_quest,
            image_prompt,
            options,
        })
    }

    /// Produce the next session from a continuation payload
    ///
    /// Identity, genre, and visual style carry over; everything else comes
    /// from `payload`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the payload does not describe a full scene
    pub fn advance(&self, payload: StoryPayload) -> Result<Self> {
        payload.validate()?;

        let StoryPayload {
            story_text,
            inventory,
            current_quest,
            image_prompt,
            options,
        } = payload;

        let mut history = self.history.clone();
        history.push(story_text.clone());

        Ok(Self {
            id: self.id,
            started_at: self.started_at,
            genre: self.genre.clone(),
            visual_style: self.visual_style.clone(),
            story_text,
            inventory,
            current_quest,
            image_prompt,
            options,
            history,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn visual_style(&self) -> &str {
        &self.visual_style
    }

    pub fn story_text(&self) -> &str {
        &self.story_text
    }

    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn current_quest(&self) -> &str {
        &self.current_quest
    }

    pub fn image_prompt(&self) -> &str {
        &self.image_prompt
    }

    pub fn options(&self) -> &[ChoiceDescriptor] {
        &self.options
    }

    /// Every story text so far, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Number of scenes shown, starting at 1 for the opening
    pub fn turn(&self) -> usize {
        self.history.len()
    }

    /// True when `option` is one of the current choices
    pub fn offers(&self, option: &ChoiceDescriptor) -> bool {
        self.options.contains(option)
    }

    /// Context sent with a continuation request
    pub fn context(&self) -> SessionContext {
        let start = self.history.len().saturating_sub(RECENT_HISTORY_LEN);
        SessionContext {
            current_quest: self.current_quest.clone(),
            inventory: self.inventory.clone(),
            recent_history: self.history[start..].to_vec(),
            visual_style: self.visual_style.clone(),
        }
    }

    /// One-line summary handed to the companion on every chat call
    pub fn context_summary(&self) -> String {
        format!(
            "Story: {}. Quest: {}. Inventory: {}",
            self.story_text,
            self.current_quest,
            self.inventory.join(", ")
        )
    }
}
