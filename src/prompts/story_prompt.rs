//! Story prompts for opening and continuing an adventure

use crate::oracle::SessionContext;

/// System instruction shared by the opening and continuation calls
pub const STORY_SYSTEM_PROMPT: &str = r#"You are a world-class dungeon master and story weaver. Your goal is to guide the user through an infinite, reactive choose-your-own-adventure.
Rules:
1. Every choice must genuinely change the plot.
2. Track items and quests strictly. If the user gains an item, it must be added to inventory.
3. Keep descriptions evocative but concise (2-3 paragraphs).
4. Provide 4 distinct options for the next step.
5. You MUST return valid JSON matching the schema.
6. The visual style is fixed by the user at the start. Use it to create image prompts."#;

/// Builds the user prompt that opens a new adventure
///
/// # Examples
///
/// ```
/// use chronos_weaver::prompts::build_opening_prompt;
///
/// let prompt = build_opening_prompt("Cyberpunk", "Dark Noir");
/// assert!(prompt.contains("genre: Cyberpunk"));
/// assert!(prompt.contains("Dark Noir"));
/// ```
pub fn build_opening_prompt(genre: &str, visual_style: &str) -> String {
    format!(
        "Start a new adventure in the genre: {}. The visual style for the journey is: {}. \
         Provide the opening scene, initial inventory, a starting quest, and 4 options.",
        genre, visual_style
    )
}

/// Builds the user prompt for the next scene
///
/// Carries the quest, inventory, recent story, style, and the chosen option.
pub fn build_continuation_prompt(context: &SessionContext, choice_text: &str) -> String {
    format!(
        "CURRENT QUEST: {}\nINVENTORY: {}\nRECENT STORY: {}\nVISUAL STYLE: {}\nUSER CHOICE: {}",
        context.current_quest,
        context.inventory.join(", "),
        context.recent_history.join("\n"),
        context.visual_style,
        choice_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_demands_four_options() {
        assert!(STORY_SYSTEM_PROMPT.contains("4 distinct options"));
        assert!(STORY_SYSTEM_PROMPT.contains("JSON"));
    }

    #[test]
    fn test_continuation_prompt_sections() {
        let context = SessionContext {
            current_quest: "Escape".to_string(),
            inventory: vec!["torch".to_string(), "rope".to_string()],
            recent_history: vec!["one".to_string(), "two".to_string()],
            visual_style: "Oil Painting".to_string(),
        };
        let prompt = build_continuation_prompt(&context, "Climb: Scale the wall");

        assert!(prompt.contains("CURRENT QUEST: Escape"));
        assert!(prompt.contains("INVENTORY: torch, rope"));
        assert!(prompt.contains("RECENT STORY: one\ntwo"));
        assert!(prompt.contains("VISUAL STYLE: Oil Painting"));
        assert!(prompt.ends_with("USER CHOICE: Climb: Scale the wall"));
    }

    #[test]
    fn test_continuation_prompt_empty_inventory() {
        let context = SessionContext {
            current_quest: String::new(),
            inventory: vec![],
            recent_history: vec!["only".to_string()],
            visual_style: "Dark Noir".to_string(),
        };
        let prompt = build_continuation_prompt(&context, "Wait: Do nothing");
        assert!(prompt.contains("INVENTORY: \n"));
    }
}
