//! API key providers
//!
//! The default provider reads the key from the environment first and the
//! OS keyring second (Keychain on macOS, Secret Service on Linux, Windows
//! Credential Manager on Windows). Selecting a key stores it in the keyring.

use crate::error::{ChronosError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Keyring service name used for the stored API key
pub const KEYRING_SERVICE: &str = "chronos-weaver";

/// Keyring user name used for the stored API key
pub const KEYRING_USER: &str = "gemini_api_key";

/// Environment variables consulted for the API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Interactive key prompt
///
/// Runs on a blocking thread. Returns `Ok(None)` when the user entered
/// nothing.
pub type KeyPrompter = Arc<dyn Fn() -> Result<Option<String>> + Send + Sync>;

/// Source of the oracle API key
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current API key, if one is available
    async fn api_key(&self) -> Result<Option<String>>;

    /// Non-interactive presence check
    async fn check_existing(&self) -> Result<bool> {
        Ok(self.api_key().await?.is_some())
    }

    /// Let the user select a key
    ///
    /// Completion is the only signal; the caller does not re-verify the key.
    async fn prompt_selection(&self) -> Result<()>;
}

/// Environment + OS keyring credential provider
pub struct KeyringCredentialProvider {
    keyring_service: String,
    keyring_user: String,
    env_vars: Vec<String>,
    prompter: Option<KeyPrompter>,
}

impl KeyringCredentialProvider {
    /// Create a provider with the default keyring entry and env vars
    ///
    /// # Examples
    ///
    /// ```
    /// use chronos_weaver::credentials::KeyringCredentialProvider;
    ///
    /// let provider = KeyringCredentialProvider::new();
    /// assert_eq!(provider.keyring_service(), "chronos-weaver");
    /// ```
    pub fn new() -> Self {
        Self {
            keyring_service: KEYRING_SERVICE.to_string(),
            keyring_user: KEYRING_USER.to_string(),
            env_vars: API_KEY_ENV_VARS.iter().map(|v| v.to_string()).collect(),
            prompter: None,
        }
    }

    /// Attach the interactive prompt used by [`CredentialProvider::prompt_selection`]
    pub fn with_prompter(mut self, prompter: KeyPrompter) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Replace the environment variables consulted before the keyring
    pub fn with_env_vars(mut self, vars: &[&str]) -> Self {
        self.env_vars = vars.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Keyring service name
    pub fn keyring_service(&self) -> &str {
        &self.keyring_service
    }

    /// First non-empty key found in the configured environment variables
    fn key_from_env(&self) -> Option<String> {
        self.env_vars.iter().find_map(|var| {
            std::env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }

    /// Key stored in the keyring, if any
    fn key_from_keyring(&self) -> Result<Option<String>> {
        let entry = keyring::Entry::new(&self.keyring_service, &self.keyring_user)?;
        match entry.get_password() {
            Ok(key) if !key.trim().is_empty() => Ok(Some(key.trim().to_string())),
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store an API key in the keyring
    ///
    /// # Errors
    ///
    /// Returns error if the key is blank or the keyring rejects the write
    pub fn store_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ChronosError::MissingCredentials("API key is empty".to_string()).into());
        }
        let entry = keyring::Entry::new(&self.keyring_service, &self.keyring_user)?;
        entry.set_password(key)?;
        tracing::info!("Stored API key in keyring ({})", self.keyring_service);
        Ok(())
    }

    /// Remove the stored API key (missing entries are not an error)
    pub fn clear_key(&self) -> Result<()> {
        let entry = keyring::Entry::new(&self.keyring_service, &self.keyring_user)?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                tracing::info!("Cleared stored API key");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for KeyringCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for KeyringCredentialProvider {
    async fn api_key(&self) -> Result<Option<String>> {
        if let Some(key) = self.key_from_env() {
            tracing::debug!("Using API key from environment");
            return Ok(Some(key));
        }
        self.key_from_keyring()
    }

    async fn prompt_selection(&self) -> Result<()> {
        let prompter = self.prompter.clone().ok_or_else(|| {
            ChronosError::MissingCredentials(format!(
                "No API key found. Set {} or run `chronos-weaver auth`",
                self.env_vars.join(" or ")
            ))
        })?;

        let selected = tokio::task::spawn_blocking(move || prompter())
            .await
            .map_err(|e| ChronosError::MissingCredentials(format!("Key prompt failed: {}", e)))??;

        match selected {
            Some(key) if !key.trim().is_empty() => {
                if let Err(e) = self.store_key(&key) {
                    tracing::warn!("Failed to store API key: {}", e);
                }
            }
            _ => tracing::debug!("Key selection finished without a new key"),
        }

        Ok(())
    }
}
