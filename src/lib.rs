//! Chronos Weaver - generative choose-your-own-adventure library
//!
//! This library provides the core of the Chronos Weaver game: a turn state
//! machine whose scenes, inventory, and illustrations come from a remote
//! generative oracle, a companion chat that runs alongside it, and the
//! credential gate that guards every oracle call.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `oracle`: Oracle trait, the Gemini REST client, and the gated wrapper
//! - `game`: Session state, the turn engine, and the companion chat
//! - `credentials`: API key provider and the credential gate
//! - `prompts`: System prompts and request text builders
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use chronos_weaver::credentials::{CredentialGate, KeyringCredentialProvider};
//! use chronos_weaver::game::GameEngine;
//! use chronos_weaver::oracle::{GatedOracle, GeminiOracle, ImageResolution};
//! use chronos_weaver::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let provider = Arc::new(KeyringCredentialProvider::new());
//!     let gate = Arc::new(CredentialGate::new(provider.clone()));
//!     gate.enter().await;
//!
//!     let gemini = Arc::new(GeminiOracle::new(config.oracle.clone(), provider)?);
//!     let engine = GameEngine::new(
//!         Arc::new(GatedOracle::new(gemini, gate)),
//!         ImageResolution::R1K,
//!     );
//!     engine.start_game("Dark Fantasy", "Oil Painting").await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod game;
pub mod oracle;
pub mod prompts;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChronosError, Result};
pub use game::{Companion, GameEngine, Session};
pub use oracle::{GatedOracle, GeminiOracle, Oracle};

#[cfg(test)]
pub mod test_utils;
