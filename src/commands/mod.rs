/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `play`   - Interactive adventure loop
- `auth`   - Select or clear the stored Gemini API key
- `styles` - List the genre and visual style catalogues

The handlers stay thin; game state lives in [`crate::game`] and all
remote calls go through a credential-gated [`crate::oracle::Oracle`].
*/

use crate::config::Config;
use crate::credentials::{CredentialGate, GateState, KeyPrompter, KeyringCredentialProvider};
use crate::error::{ChronosError, Result};
use crate::game::{DisplayImage, Session};
use crate::oracle::{ChoiceDescriptor, ImageResolution};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Special commands parser for the adventure prompt
pub mod special_commands;

/// Build a key prompter that reads the API key from the terminal
///
/// Blank input, Ctrl-C, and Ctrl-D all cancel without a key.
pub fn terminal_key_prompter() -> KeyPrompter {
    Arc::new(|| -> Result<Option<String>> {
        let mut rl = DefaultEditor::new()?;
        match rl.readline("Gemini API key (blank to cancel): ") {
            Ok(line) => {
                let key = line.trim().to_string();
                Ok((!key.is_empty()).then_some(key))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    })
}

/// Comma-separated inventory, or a placeholder when empty
///
/// # Examples
///
/// ```
/// use chronos_weaver::commands::format_inventory;
///
/// assert_eq!(format_inventory(&[]), "empty-handed");
/// assert_eq!(format_inventory(&["rope".to_string(), "rope".to_string()]), "rope, rope");
/// ```
pub fn format_inventory(inventory: &[String]) -> String {
    if inventory.is_empty() {
        "empty-handed".to_string()
    } else {
        inventory.join(", ")
    }
}

/// Status line shown under every scene and by `/status`
pub fn format_status_line(session: &Session, resolution: ImageResolution) -> String {
    let quest = if session.current_quest().trim().is_empty() {
        "(none)"
    } else {
        session.current_quest()
    };
    format!(
        "Turn {} | Quest: {} | Inventory: {} | Images: {}",
        session.turn(),
        quest,
        format_inventory(session.inventory()),
        resolution
    )
}

/// Numbered option lines, starting at 1
pub fn format_options(options: &[ChoiceDescriptor]) -> Vec<String> {
    options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {}", i + 1, option.choice_text()))
        .collect()
}

/// File name for a saved scene image
///
/// Names sort by session start time and then by turn.
pub fn scene_file_name(session: &Session, image: &DisplayImage) -> String {
    let id = session.id().simple().to_string();
    format!(
        "{}-{}-turn{:03}.{}",
        session.started_at().format("%Y%m%d-%H%M%S"),
        &id[..8],
        image.turn,
        image.image.extension()
    )
}

/// Write the scene image into `dir`, creating it if needed
///
/// # Errors
///
/// Returns an IO error if the directory or file cannot be written
pub fn save_scene_image(dir: &Path, session: &Session, image: &DisplayImage) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(scene_file_name(session, image));
    std::fs::write(&path, &image.image.data)?;
    tracing::debug!(
        "Saved scene {} ({} bytes) to {}",
        image.turn,
        image.image.data.len(),
        path.display()
    );
    Ok(path)
}

/// Run key selection on `gate`, reporting instead of failing
///
/// Returns the gate state afterwards.
async fn reselect_key(gate: &CredentialGate, reason: &str) -> GateState {
    use colored::Colorize;

    println!("{}", reason.yellow());
    if let Err(e) = gate.select().await {
        eprintln!("{}", format!("Key selection failed: {}", e).red());
    }
    gate.state()
}

// Play command handler
pub mod play {
    //! Interactive adventure loop.
    //!
    //! Passes the credential gate, builds the Gemini oracle behind it, and
    //! runs a readline loop that turns numbers into choices and `/commands`
    //! into engine and companion calls.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::game::{
        find_genre, find_style, ChatOutcome, Companion, GameEngine, IgnoreReason, TurnOutcome,
        GENRES, VISUAL_STYLES,
    };
    use crate::oracle::{GatedOracle, GeminiOracle, Oracle};
    use colored::Colorize;

    type Lookup = fn(&str) -> Option<&'static str>;

    /// Start an interactive adventure
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `genre` - Optional genre; prompted for when absent
    /// * `style` - Optional visual style; prompted for when absent
    ///
    /// # Errors
    ///
    /// Returns an error if no API key can be selected, a preset genre or
    /// style is unknown, or the terminal cannot be read. Oracle failures
    /// during play are reported and the loop continues.
    pub async fn run_play(
        config: Config,
        genre: Option<String>,
        style: Option<String>,
    ) -> Result<()> {
        tracing::info!("Starting interactive adventure");

        let mut genre_preset = genre.map(|g| resolve_preset(&g, "genre", find_genre)).transpose()?;
        let mut style_preset = style
            .map(|s| resolve_preset(&s, "visual style", find_style))
            .transpose()?;

        let provider = Arc::new(
            KeyringCredentialProvider::new().with_prompter(terminal_key_prompter()),
        );
        let gate = Arc::new(CredentialGate::new(provider.clone()));
        if gate.enter().await != GateState::Passed
            && reselect_key(&gate, "No Gemini API key found.").await != GateState::Passed
        {
            return Err(ChronosError::MissingCredentials(
                "a Gemini API key is required to play".to_string(),
            )
            .into());
        }

        let gemini = GeminiOracle::new(config.oracle.clone(), provider)?;
        let oracle: Arc<dyn Oracle> =
            Arc::new(GatedOracle::new(Arc::new(gemini), Arc::clone(&gate)));
        let engine = GameEngine::new(Arc::clone(&oracle), config.game.default_resolution);
        let companion = Companion::new(oracle, engine.subscribe(), config.chat.clone());
        let image_dir = config
            .game
            .save_images
            .then(|| config.game.resolved_image_dir());

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner();

        'setup: loop {
            let genre = match genre_preset.take() {
                Some(genre) => genre,
                None => match pick_from(&mut rl, "Genre", &GENRES, find_genre)? {
                    Some(genre) => genre,
                    None => break 'setup,
                },
            };
            let style = match style_preset.take() {
                Some(style) => style,
                None => match pick_from(&mut rl, "Visual style", &VISUAL_STYLES, find_style)? {
                    Some(style) => style,
                    None => break 'setup,
                },
            };

            println!("{}", "Weaving your opening scene...".dimmed());
            match engine.start_game(genre, style).await {
                Ok(outcome) => report_turn(&engine, &gate, outcome, image_dir.as_deref()).await,
                Err(e) => {
                    report_turn_error(&gate, &e).await;
                    continue 'setup;
                }
            }

            loop {
                let line = match rl.readline(&format!("{} ", ">>".bold())) {
                    Ok(line) => line,
                    Err(ReadlineError::Interrupted) => {
                        println!("CTRL-C");
                        break 'setup;
                    }
                    Err(ReadlineError::Eof) => {
                        println!("CTRL-D");
                        break 'setup;
                    }
                    Err(err) => {
                        tracing::error!("Readline error: {:?}", err);
                        break 'setup;
                    }
                };

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", e.to_string().red());
                        continue;
                    }
                };

                match command {
                    SpecialCommand::Choose(index) => {
                        println!("{}", "The threads of fate are weaving...".dimmed());
                        match engine.choose_index(index).await {
                            Ok(outcome) => {
                                report_turn(&engine, &gate, outcome, image_dir.as_deref()).await
                            }
                            Err(e) => report_turn_error(&gate, &e).await,
                        }
                    }
                    SpecialCommand::Chat(text) => match companion.send_message(&text).await {
                        Ok(outcome) => print_chat_outcome(&outcome),
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    },
                    SpecialCommand::SetResolution(resolution) => {
                        engine.set_resolution(resolution);
                        println!("Scene images will be painted at {}", resolution);
                    }
                    SpecialCommand::ShowResolution => {
                        println!("Scene images are painted at {}", engine.resolution());
                    }
                    SpecialCommand::ShowStatus => match engine.session() {
                        Some(session) => {
                            println!("{}", format_status_line(&session, engine.resolution()))
                        }
                        None => println!("No adventure in progress"),
                    },
                    SpecialCommand::ShowInventory => {
                        if let Some(session) = engine.session() {
                            println!("Inventory: {}", format_inventory(session.inventory()));
                        }
                    }
                    SpecialCommand::ShowHistory => {
                        if let Some(session) = engine.session() {
                            for (i, text) in session.history().iter().enumerate() {
                                println!("{}\n{}\n", format!("Scene {}", i + 1).bold(), text);
                            }
                        }
                    }
                    SpecialCommand::ShowChat => {
                        let messages = companion.messages();
                        if messages.is_empty() {
                            println!("The Chronicler has not spoken yet. Try /chat <message>");
                        }
                        for message in messages {
                            println!("{}: {}", message.role, message.content);
                        }
                    }
                    SpecialCommand::Auth => {
                        reselect_key(&gate, "Select a new Gemini API key.").await;
                    }
                    SpecialCommand::Restart => {
                        if engine.restart() {
                            println!("{}", "The tale unravels. A new one awaits.".yellow());
                            continue 'setup;
                        }
                        println!("{}", "Wait for the current scene to finish.".yellow());
                    }
                    SpecialCommand::Help => print_help(),
                    SpecialCommand::Exit => break 'setup,
                    SpecialCommand::None => println!(
                        "{}",
                        "Pick an option 1-4, or /chat to talk to the Chronicler. /help lists commands."
                            .yellow()
                    ),
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Canonical catalogue name for a value given on the command line
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the unknown value
    pub(crate) fn resolve_preset(value: &str, kind: &str, lookup: Lookup) -> Result<&'static str> {
        lookup(value).ok_or_else(|| {
            ChronosError::InvalidInput(format!(
                "unknown {} '{}'; run `chronos-weaver styles` to list them",
                kind, value
            ))
            .into()
        })
    }

    /// Match a menu answer given as a 1-based number or a name
    pub(crate) fn parse_pick(
        input: &str,
        choices: &[&'static str],
        lookup: Lookup,
    ) -> Option<&'static str> {
        let input = input.trim();
        match input.parse::<usize>() {
            Ok(n) if (1..=choices.len()).contains(&n) => Some(choices[n - 1]),
            Ok(_) => None,
            Err(_) => lookup(input),
        }
    }

    fn pick_from(
        rl: &mut DefaultEditor,
        title: &str,
        choices: &[&'static str],
        lookup: Lookup,
    ) -> Result<Option<&'static str>> {
        println!("\n{}", title.bold());
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}. {}", i + 1, choice);
        }

        loop {
            match rl.readline(&format!("Choose [1-{}]: ", choices.len())) {
                Ok(line) => {
                    if let Some(choice) = parse_pick(&line, choices, lookup) {
                        return Ok(Some(choice));
                    }
                    println!("{}", "Pick a number or type a name from the list.".yellow());
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn report_turn(
        engine: &GameEngine,
        gate: &CredentialGate,
        outcome: TurnOutcome,
        image_dir: Option<&Path>,
    ) {
        match outcome {
            TurnOutcome::Ignored(IgnoreReason::TurnInFlight) => {
                println!("{}", "The current scene is still being woven.".yellow());
                return;
            }
            TurnOutcome::Ignored(IgnoreReason::NoSession) => {
                println!("{}", "No adventure in progress.".yellow());
                return;
            }
            TurnOutcome::Completed { .. } | TurnOutcome::CredentialRevoked => {}
        }

        let Some(session) = engine.session() else {
            return;
        };
        print_scene(&session, engine.resolution());

        match (engine.display_image(), image_dir) {
            (Some(image), Some(dir)) => match save_scene_image(dir, &session, &image) {
                Ok(path) => println!("{}", format!("Scene image: {}", path.display()).dimmed()),
                Err(e) => tracing::warn!("Could not save scene image: {}", e),
            },
            (Some(_), None) => {}
            (None, _) => println!("{}", "(The scene could not be painted this time.)".dimmed()),
        }

        if outcome == TurnOutcome::CredentialRevoked {
            reselect_key(
                gate,
                "The Gemini API no longer recognises your key. Select another to continue.",
            )
            .await;
        }
    }

    async fn report_turn_error(gate: &CredentialGate, err: &anyhow::Error) {
        match err.downcast_ref::<ChronosError>() {
            Some(ChronosError::CredentialGateBlocked) | Some(ChronosError::MissingCredentials(_)) => {
                reselect_key(gate, "A Gemini API key is required to continue.").await;
            }
            _ => eprintln!("{}", format!("The oracle faltered: {}", err).red()),
        }
    }

    fn print_scene(session: &Session, resolution: ImageResolution) {
        println!("\n{}", format!("=== Scene {} ===", session.turn()).bold());
        println!("{}\n", session.story_text());
        println!("{}", format_status_line(session, resolution).dimmed());
        for line in format_options(session.options()) {
            println!("  {}", line.cyan());
        }
        println!();
    }

    fn print_chat_outcome(outcome: &ChatOutcome) {
        match outcome {
            ChatOutcome::Replied(text) => println!("{} {}", "Chronicler:".magenta().bold(), text),
            ChatOutcome::Fallback(text) => {
                println!("{} {}", "Chronicler:".magenta().bold(), text.dimmed())
            }
            ChatOutcome::Ignored(_) => {
                println!("{}", "The Chronicler is still answering.".yellow())
            }
        }
    }

    fn print_welcome_banner() {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                 Chronos Weaver - Welcome!                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Choose a genre and a visual style, then pick 1-4 each scene.");
        println!("Type '/help' for available commands, '/quit' to leave\n");
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_resolve_preset_accepts_any_case() {
            assert_eq!(
                resolve_preset("cthulhu mythos", "genre", find_genre).unwrap(),
                "Cthulhu Mythos"
            );
        }

        #[test]
        fn test_resolve_preset_rejects_unknown() {
            let err = resolve_preset("Romance", "genre", find_genre).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ChronosError>(),
                Some(ChronosError::InvalidInput(_))
            ));
            assert!(err.to_string().contains("Romance"));
        }

        #[test]
        fn test_parse_pick_by_number_or_name() {
            assert_eq!(parse_pick("1", &GENRES, find_genre), Some("Dark Fantasy"));
            assert_eq!(parse_pick(" 6 ", &GENRES, find_genre), Some("High Fantasy"));
            assert_eq!(
                parse_pick("dark noir", &VISUAL_STYLES, find_style),
                Some("Dark Noir")
            );
        }

        #[test]
        fn test_parse_pick_rejects_out_of_range() {
            assert_eq!(parse_pick("0", &GENRES, find_genre), None);
            assert_eq!(parse_pick("7", &GENRES, find_genre), None);
            assert_eq!(parse_pick("Pixel Art", &VISUAL_STYLES, find_style), None);
        }
    }
}

// Auth command handler
pub mod auth {
    use super::*;

    /// Select a new API key, or remove the stored one
    ///
    /// # Arguments
    ///
    /// * `clear` - Remove the keyring entry instead of prompting
    pub async fn authenticate(clear: bool) -> Result<()> {
        let provider = KeyringCredentialProvider::new().with_prompter(terminal_key_prompter());

        if clear {
            provider.clear_key()?;
            println!(
                "Removed the stored Gemini API key from the {} keyring entry.",
                provider.keyring_service()
            );
            return Ok(());
        }

        let gate = CredentialGate::new(Arc::new(provider));
        if gate.enter().await == GateState::Passed {
            println!("A Gemini API key is already available. Enter a new one to replace it.");
        }

        match gate.select().await {
            Ok(_) => {
                println!("Gemini API key selected.");
                Ok(())
            }
            Err(e) => {
                eprintln!("Key selection failed: {}", e);
                Err(e)
            }
        }
    }
}

// Styles command handler
pub mod styles {
    use crate::game::{GENRES, VISUAL_STYLES};
    use crate::oracle::ImageResolution;

    /// Catalogue listing printed by `chronos-weaver styles`
    pub fn render_catalog() -> String {
        let mut out = String::from("Genres:\n");
        for genre in GENRES {
            out.push_str(&format!("  {}\n", genre));
        }
        out.push_str("\nVisual styles:\n");
        for style in VISUAL_STYLES {
            out.push_str(&format!("  {}\n", style));
        }
        let resolutions: Vec<&str> = ImageResolution::ALL.iter().map(|r| r.as_str()).collect();
        out.push_str(&format!("\nImage resolutions: {}\n", resolutions.join(", ")));
        out
    }

    /// Print the genre and visual style catalogues
    pub fn list_styles() {
        print!("{}", render_catalog());
    }

}
