//! Prompt builders for the story, image, and companion calls
//!
//! The wording here is what the oracle sees. Nothing in the game state
//! machine depends on it.

pub mod companion_prompt;
pub mod story_prompt;

pub use companion_prompt::build_companion_prompt;
pub use story_prompt::{build_continuation_prompt, build_opening_prompt, STORY_SYSTEM_PROMPT};

/// Decorates an image prompt with the session's fixed visual style
///
/// # Examples
///
/// ```
/// use chronos_weaver::prompts::build_image_prompt;
///
/// let prompt = build_image_prompt("a flooded crypt", "Oil Painting");
/// assert!(prompt.starts_with("a flooded crypt. Visual style: Oil Painting."));
/// ```
pub fn build_image_prompt(image_prompt: &str, visual_style: &str) -> String {
    format!(
        "{}. Visual style: {}. Highly detailed, consistent art style, cinematic lighting.",
        image_prompt.trim_end_matches('.'),
        visual_style
    )
}
