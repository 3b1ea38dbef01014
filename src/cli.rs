//! Command-line interface definition for Chronos Weaver
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for playing, key management, and listing the
//! available genres and styles.

use crate::oracle::ImageResolution;
use clap::{Parser, Subcommand};

/// Chronos Weaver - a choose-your-own-adventure woven by a generative oracle
///
/// Every scene, inventory change, and illustration comes from the
/// Gemini API; the terminal keeps the game state and runs the turns.
#[derive(Parser, Debug, Clone)]
#[command(name = "chronos-weaver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chronos Weaver
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive adventure
    Play {
        /// Story genre (prompted for when omitted)
        #[arg(short, long)]
        genre: Option<String>,

        /// Visual style for scene images (prompted for when omitted)
        #[arg(short, long)]
        style: Option<String>,

        /// Scene image resolution: 1K, 2K or 4K
        #[arg(short, long)]
        resolution: Option<ImageResolution>,
    },

    /// Select or clear the stored Gemini API key
    Auth {
        /// Remove the key from the OS keyring instead of selecting one
        #[arg(long)]
        clear: bool,
    },

    /// List available genres and visual styles
    Styles,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            command: Commands::Styles,
        }
    }
}
