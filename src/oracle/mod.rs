//! Oracle module for Chronos Weaver
//!
//! This module contains the oracle abstraction, the Gemini implementation,
//! and the credential-gated wrapper the game talks to.

pub mod base;
pub mod gated;
pub mod gemini;

pub use base::{
    ChatMessage, ChatRole, ChoiceDescriptor, GeneratedImage, ImageResolution, Oracle,
    SessionContext, StoryPayload, CHOICE_COUNT, RECENT_HISTORY_LEN,
};
pub use gated::GatedOracle;
pub use gemini::GeminiOracle;
