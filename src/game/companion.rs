//! Companion chat running alongside the turn pipeline
//!
//! The companion never touches the session. It reads the latest committed
//! [`SessionSnapshot`] when a message is sent and keeps its own log, which
//! is dropped whenever the snapshot epoch moves on.

use crate::config::ChatConfig;
use crate::error::{ChronosError, Result};
use crate::game::engine::SessionSnapshot;
use crate::oracle::{ChatMessage, Oracle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Why a message was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIgnoreReason {
    /// The previous message has not been answered yet
    AwaitingReply,
    /// Nothing but whitespace
    EmptyMessage,
}

/// Result of sending a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The companion answered
    Replied(String),
    /// The call failed or came back empty; a canned reply was logged instead
    Fallback(String),
    Ignored(ChatIgnoreReason),
}

impl ChatOutcome {
    /// Text that was appended to the log, if any
    pub fn reply(&self) -> Option<&str> {
        match self {
            Self::Replied(text) | Self::Fallback(text) => Some(text),
            Self::Ignored(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct ChatLog {
    messages: Vec<ChatMessage>,
    awaiting_reply: bool,
    epoch: u64,
}

impl ChatLog {
    fn sync_epoch(&mut self, epoch: u64) {
        if self.epoch != epoch {
            if !self.messages.is_empty() {
                tracing::debug!("Session changed; clearing {} chat messages", self.messages.len());
            }
            self.messages.clear();
            self.epoch = epoch;
        }
    }
}

struct ReplyGuard<'a> {
    companion: &'a Companion,
}

impl Drop for ReplyGuard<'_> {
    fn drop(&mut self) {
        self.companion.log().awaiting_reply = false;
    }
}

/// Conversational side thread
pub struct Companion {
    oracle: Arc<dyn Oracle>,
    snapshots: watch::Receiver<SessionSnapshot>,
    log: Mutex<ChatLog>,
    config: ChatConfig,
}

impl Companion {
    /// Create a companion following `snapshots`
    pub fn new(
        oracle: Arc<dyn Oracle>,
        snapshots: watch::Receiver<SessionSnapshot>,
        config: ChatConfig,
    ) -> Self {
        let epoch = snapshots.borrow().epoch;
        Self {
            oracle,
            snapshots,
            log: Mutex::new(ChatLog {
                epoch,
                ..ChatLog::default()
            }),
            config,
        }
    }

    fn log(&self) -> MutexGuard<'_, ChatLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_epoch(&self) -> u64 {
        self.snapshots.borrow().epoch
    }

    /// Messages exchanged in the current session, oldest first
    pub fn messages(&self) -> Vec<ChatMessage> {
        let epoch = self.current_epoch();
        let mut log = self.log();
        log.sync_epoch(epoch);
        log.messages.clone()
    }

    /// True while a reply is outstanding
    pub fn is_awaiting_reply(&self) -> bool {
        self.log().awaiting_reply
    }

    /// Send a message to the companion
    ///
    /// # Errors
    ///
    /// Returns `NoSession` when no session has been committed yet and
    /// `InvalidInput` when the message exceeds the configured length. Oracle
    /// failures are not errors; they produce [`ChatOutcome::Fallback`].
    pub async fn send_message(&self, text: &str) -> Result<ChatOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(ChatOutcome::Ignored(ChatIgnoreReason::EmptyMessage));
        }

        let length = text.chars().count();
        if length > self.config.max_message_chars {
            return Err(ChronosError::InvalidInput(format!(
                "message is {} characters; the limit is {}",
                length, self.config.max_message_chars
            ))
            .into());
        }

        let snapshot = self.snapshots.borrow().clone();
        let session = snapshot.session.ok_or(ChronosError::NoSession)?;

        let prior = {
            let mut log = self.log();
            log.sync_epoch(snapshot.epoch);
            if log.awaiting_reply {
                tracing::debug!("Chat message ignored; reply pending");
                return Ok(ChatOutcome::Ignored(ChatIgnoreReason::AwaitingReply));
            }
            let prior = log.messages.clone();
            log.messages.push(ChatMessage::user(text));
            log.awaiting_reply = true;
            prior
        };
        let _guard = ReplyGuard { companion: self };

        tracing::debug!(
            "Chat request: {} chars, {} prior messages",
            length,
            prior.len()
        );
        let outcome = match self
            .oracle
            .chat(text, &prior, &session.context_summary())
            .await
        {
            Ok(reply) if !reply.trim().is_empty() => ChatOutcome::Replied(reply.trim().to_string()),
            Ok(_) => {
                tracing::warn!("Companion returned an empty reply");
                ChatOutcome::Fallback(self.config.silent_reply.clone())
            }
            Err(e) => {
                tracing::warn!("Companion chat failed: {:#}", e);
                ChatOutcome::Fallback(self.config.error_reply.clone())
            }
        };

        let current = self.current_epoch();
        let mut log = self.log();
        log.sync_epoch(current);
        if current == snapshot.epoch {
            if let Some(reply) = outcome.reply() {
                log.messages.push(ChatMessage::companion(reply));
            }
        } else {
            tracing::debug!("Session changed while awaiting reply; reply dropped");
        }

        Ok(outcome)
    }
}
