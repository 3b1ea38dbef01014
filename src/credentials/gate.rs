//! Credential gate guarding every oracle call
//!
//! The gate starts in `Checking`, settles into `Passed` or `Blocked` after a
//! non-interactive presence check, and can be forced back to `Blocked` at
//! any time when the oracle reports that the credential stopped working.
//! State changes are published on a watch channel so front-ends can react
//! to a revocation that happens mid-turn.

use crate::credentials::CredentialProvider;
use crate::error::{ChronosError, Result};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Presence check in progress
    Checking,
    /// No usable credential; oracle access denied
    Blocked,
    /// Oracle access granted until revoked
    Passed,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "CHECKING"),
            Self::Blocked => write!(f, "BLOCKED"),
            Self::Passed => write!(f, "PASSED"),
        }
    }
}

/// Access-control precondition for the oracle
pub struct CredentialGate {
    provider: Arc<dyn CredentialProvider>,
    state: watch::Sender<GateState>,
}

impl CredentialGate {
    /// Create a gate in the `Checking` state
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        let (state, _) = watch::channel(GateState::Checking);
        Self { provider, state }
    }

    /// Current state
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// True when oracle calls are allowed
    pub fn is_passed(&self) -> bool {
        self.state() == GateState::Passed
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Run the non-interactive presence check
    ///
    /// A failing check is treated the same as an absent credential.
    pub async fn enter(&self) -> GateState {
        self.state.send_replace(GateState::Checking);

        let next = match self.provider.check_existing().await {
            Ok(true) => GateState::Passed,
            Ok(false) => GateState::Blocked,
            Err(e) => {
                tracing::warn!("Credential check failed: {}", e);
                GateState::Blocked
            }
        };

        tracing::info!("Credential gate: {}", next);
        self.state.send_replace(next);
        next
    }

    /// Run the user-initiated key selection, then pass optimistically
    ///
    /// The selected key is not re-verified before access is granted.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the selection itself failed; the gate
    /// stays where it was.
    pub async fn select(&self) -> Result<GateState> {
        self.provider.prompt_selection().await?;
        self.state.send_replace(GateState::Passed);
        tracing::info!("Credential gate: {} (key selected)", GateState::Passed);
        Ok(GateState::Passed)
    }

    /// Force the gate back to `Blocked`
    pub fn revoke(&self) {
        let previous = self.state.send_replace(GateState::Blocked);
        if previous != GateState::Blocked {
            tracing::warn!("Credential gate revoked; key selection required");
        }
    }

    /// Require the gate to be passed
    ///
    /// # Errors
    ///
    /// Returns [`ChronosError::CredentialGateBlocked`] otherwise
    pub fn ensure_passed(&self) -> Result<()> {
        if self.is_passed() {
            Ok(())
        } else {
            Err(ChronosError::CredentialGateBlocked.into())
        }
    }

    /// The provider behind this gate
    pub fn provider(&self) -> Arc<dyn CredentialProvider> {
        Arc::clone(&self.provider)
    }
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate")
            .field("state", &self.state())
            .finish()
    }
}
