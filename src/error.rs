//! Error types for Chronos Weaver
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Chronos Weaver operations
///
/// Covers configuration loading, oracle calls, credential gating,
/// and game state transitions. Callers that need to branch on a
/// specific condition use `anyhow::Error::downcast_ref::<ChronosError>()`.
#[derive(Error, Debug)]
pub enum ChronosError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport or service failure talking to the oracle
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// The oracle reported that the credential no longer resolves
    ///
    /// Raised only by image generation. The credential gate must be
    /// re-entered before any further oracle call.
    #[error("Credential invalidated: the oracle no longer recognises the configured key")]
    CredentialInvalidated,

    /// Oracle response is missing required fields or has the wrong shape
    #[error("Malformed oracle payload: {0}")]
    MalformedPayload(String),

    /// An oracle call was attempted while the credential gate is not passed
    #[error("Credential gate is blocked; select an API key before continuing")]
    CredentialGateBlocked,

    /// No credential is available for the oracle
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The chosen option is not part of the current scene
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    /// User input rejected before reaching the oracle
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A new game was requested while one is already running
    #[error("A session already exists; restart it before starting a new game")]
    SessionExists,

    /// An operation needed a running session but none exists
    #[error("No game session has been started")]
    NoSession,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Chronos Weaver operations
///
/// Uses `anyhow::Error` so context can be attached while the typed
/// [`ChronosError`] stays recoverable through downcasting.
pub type Result<T> = anyhow::Result<T>;

/// Returns true when `err` carries [`ChronosError::CredentialInvalidated`]
pub fn is_credential_invalidated(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ChronosError>(),
        Some(ChronosError::CredentialInvalidated)
    )
}
