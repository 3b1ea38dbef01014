//! System prompt for the companion persona

/// Builds the companion system instruction around the current story context
///
/// # Examples
///
/// ```
/// use chronos_weaver::prompts::build_companion_prompt;
///
/// let prompt = build_companion_prompt("Story: A crypt. Quest: Escape. Inventory: ");
/// assert!(prompt.contains("The Chronicler"));
/// assert!(prompt.contains("Quest: Escape"));
/// ```
pub fn build_companion_prompt(context_summary: &str) -> String {
    format!(
        "You are \"The Chronicler\", an AI companion for the user's adventure. \
         You know everything about the current story state: {}. \
         Answer questions, provide hints, or just chat in character. \
         Stay helpful and immersive.",
        context_summary
    )
}
