//! Special commands parser for the interactive game loop
//!
//! This module parses the input typed at the adventure prompt. A bare
//! number picks one of the current options; everything else that the game
//! understands is prefixed with `/`. Command names are case-insensitive,
//! but the text passed to `/chat` is kept as typed.

use crate::oracle::{ImageResolution, CHOICE_COUNT};
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Option number outside the current scene's choices
    #[error("There is no option {0}; pick 1-{max}", max = CHOICE_COUNT)]
    OptionOutOfRange(usize),
}

/// Commands understood at the adventure prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Pick an option by zero-based index
    Choose(usize),

    /// Talk to the companion
    Chat(String),

    /// Change the resolution of the next scene images
    SetResolution(ImageResolution),

    /// Print the current resolution
    ShowResolution,

    /// Print turn, quest, inventory and resolution
    ShowStatus,

    /// Print the inventory
    ShowInventory,

    /// Print every scene so far
    ShowHistory,

    /// Print the companion conversation
    ShowChat,

    /// Select a new API key
    Auth,

    /// Discard the adventure and return to setup
    Restart,

    /// Display help information
    Help,

    /// Exit the game
    Exit,

    /// Not a special command
    None,
}

/// Parse a line typed at the adventure prompt
///
/// # Errors
///
/// Returns a [`CommandError`] describing what was wrong with the command
///
/// # Examples
///
/// ```
/// use chronos_weaver::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("2").unwrap(), SpecialCommand::Choose(1));
/// assert_eq!(
///     parse_special_command("/chat Who built this tower?").unwrap(),
///     SpecialCommand::Chat("Who built this tower?".to_string())
/// );
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if let Ok(number) = trimmed.parse::<usize>() {
        return if (1..=CHOICE_COUNT).contains(&number) {
            Ok(SpecialCommand::Choose(number - 1))
        } else {
            Err(CommandError::OptionOutOfRange(number))
        };
    }

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (head, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(head, rest)| (head, rest.trim()))
        .unwrap_or((trimmed, ""));

    match head.to_lowercase().as_str() {
        "/chat" | "/ask" => {
            if rest.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/chat".to_string(),
                    usage: "/chat <message>".to_string(),
                })
            } else {
                Ok(SpecialCommand::Chat(rest.to_string()))
            }
        }
        "/res" | "/resolution" => {
            if rest.is_empty() {
                Ok(SpecialCommand::ShowResolution)
            } else {
                rest.parse::<ImageResolution>()
                    .map(SpecialCommand::SetResolution)
                    .map_err(|_| CommandError::UnsupportedArgument {
                        command: "/res".to_string(),
                        arg: rest.to_string(),
                    })
            }
        }
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/inventory" | "/inv" => Ok(SpecialCommand::ShowInventory),
        "/history" => Ok(SpecialCommand::ShowHistory),
        "/log" => Ok(SpecialCommand::ShowChat),
        "/auth" => Ok(SpecialCommand::Auth),
        "/restart" | "/new" => Ok(SpecialCommand::Restart),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/quit" | "/exit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the help text for the adventure prompt
pub fn print_help() {
    println!(
        r#"
Adventure Commands
==================

CHOOSING:
  1-4             - Take the numbered option

COMPANION:
  /chat <text>    - Ask the Chronicler something
  /ask <text>     - Same as /chat
  /log            - Show the conversation so far

SCENE IMAGES:
  /res            - Show the current image resolution
  /res <1K|2K|4K> - Use a new resolution from the next scene on

SESSION INFORMATION:
  /status         - Show turn, quest, inventory and resolution
  /inventory      - Show what you are carrying
  /history        - Replay every scene so far
  /help           - Show this help message

SESSION CONTROL:
  /auth           - Select a different Gemini API key
  /restart        - Abandon this adventure and pick a new one
  /quit           - Leave the game (also: exit, quit)

NOTES:
  - Commands are case-insensitive
  - Choices and chat are independent; you can chat while a scene is being woven
"#
    );
}
