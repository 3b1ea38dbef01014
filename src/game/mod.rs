//! Game state and the turn pipeline
//!
//! [`GameEngine`] runs turns against the oracle and publishes each committed
//! [`Session`]; [`Companion`] chats alongside it using those snapshots.

pub mod catalog;
pub mod companion;
pub mod engine;
pub mod session;

pub use catalog::{find_genre, find_style, GENRES, VISUAL_STYLES};
pub use companion::{ChatIgnoreReason, ChatOutcome, Companion};
pub use engine::{
    DisplayImage, GameEngine, IgnoreReason, SessionSnapshot, TurnOutcome, TurnStatus,
};
pub use session::Session;
