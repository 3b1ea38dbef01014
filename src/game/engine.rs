//! Turn state machine
//!
//! [`GameEngine`] owns the authoritative [`Session`] and sequences the two
//! oracle calls that make up a turn: story first, then the scene image. At
//! most one turn is in flight; a request made while one is running is
//! ignored rather than queued.
//!
//! Committed sessions are published on a watch channel as
//! [`SessionSnapshot`]s. The snapshot `epoch` increments whenever a new
//! session begins or the current one is discarded, which is how the
//! companion chat knows to clear its log.

use crate::error::{is_credential_invalidated, ChronosError, Result};
use crate::game::session::Session;
use crate::oracle::{ChoiceDescriptor, GeneratedImage, ImageResolution, Oracle};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Where the turn pipeline currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnStatus {
    #[default]
    Idle,
    AwaitingStory,
    AwaitingImage,
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingStory => write!(f, "weaving story"),
            Self::AwaitingImage => write!(f, "painting scene"),
        }
    }
}

/// Scene image for the current turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    /// Turn the image belongs to
    pub turn: usize,
    pub image: GeneratedImage,
}

/// Why a turn request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another turn is still in flight
    TurnInFlight,
    /// No session to continue
    NoSession,
}

/// Result of a turn request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Story applied; `image_ready` reports whether a scene image was produced
    Completed { image_ready: bool },
    /// Story applied but the credential stopped working during the image call
    CredentialRevoked,
    /// Nothing happened
    Ignored(IgnoreReason),
}

/// Latest committed session as seen by observers
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Changes when a session starts or is discarded
    pub epoch: u64,
    pub session: Option<Arc<Session>>,
}

#[derive(Debug, Default)]
struct EngineState {
    status: TurnStatus,
    session: Option<Arc<Session>>,
    display_image: Option<DisplayImage>,
    resolution: ImageResolution,
    epoch: u64,
}

/// Returns the engine to `Idle` when a turn finishes, fails, or is dropped
struct TurnGuard<'a> {
    engine: &'a GameEngine,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.engine.state();
        tracing::debug!("Turn status: {} -> {}", state.status, TurnStatus::Idle);
        state.status = TurnStatus::Idle;
    }
}

/// Session state machine
pub struct GameEngine {
    oracle: Arc<dyn Oracle>,
    state: Mutex<EngineState>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl GameEngine {
    /// Create an idle engine with no session
    ///
    /// `oracle` should already be wrapped in a
    /// [`GatedOracle`](crate::oracle::GatedOracle) so credential revocation
    /// reaches the gate.
    pub fn new(oracle: Arc<dyn Oracle>, resolution: ImageResolution) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            oracle,
            state: Mutex::new(EngineState {
                resolution,
                ..EngineState::default()
            }),
            snapshots,
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> TurnStatus {
        self.state().status
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.state().session.clone()
    }

    pub fn display_image(&self) -> Option<DisplayImage> {
        self.state().display_image.clone()
    }

    pub fn resolution(&self) -> ImageResolution {
        self.state().resolution
    }

    /// Change the resolution used by subsequent image calls
    pub fn set_resolution(&self, resolution: ImageResolution) {
        self.state().resolution = resolution;
        tracing::debug!("Image resolution set to {}", resolution);
    }

    /// Latest committed snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Observe committed sessions
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Begin a new adventure
    ///
    /// # Errors
    ///
    /// Returns `SessionExists` if a session is already running, or the
    /// oracle's error if the opening scene could not be produced. On error
    /// no session is created.
    pub async fn start_game(&self, genre: &str, visual_style: &str) -> Result<TurnOutcome> {
        {
            let mut state = self.state();
            if state.status != TurnStatus::Idle {
                tracing::debug!("Start ignored; turn in flight ({})", state.status);
                return Ok(TurnOutcome::Ignored(IgnoreReason::TurnInFlight));
            }
            if state.session.is_some() {
                return Err(ChronosError::SessionExists.into());
            }
            state.status = TurnStatus::AwaitingStory;
            state.display_image = None;
        }
        let _guard = TurnGuard { engine: self };

        tracing::info!("Starting {} adventure in {} style", genre, visual_style);
        let payload = self
            .oracle
            .begin_session(genre, visual_style)
            .await
            .map_err(|e| {
                tracing::error!("Opening scene failed: {:#}", e);
                e
            })?;
        let session = Arc::new(Session::open(genre, visual_style, payload).map_err(|e| {
            tracing::error!("Opening scene rejected: {:#}", e);
            e
        })?);

        self.commit(Arc::clone(&session), true);
        Ok(self.paint_scene(&session).await)
    }

    /// Continue the story with one of the current options
    ///
    /// # Errors
    ///
    /// Returns `InvalidChoice` if `option` is not offered by the current
    /// scene, or the oracle's error if the story call failed. On error the
    /// session is unchanged.
    pub async fn choose_option(&self, option: &ChoiceDescriptor) -> Result<TurnOutcome> {
        let session = {
            let mut state = self.state();
            if state.status != TurnStatus::Idle {
                tracing::debug!("Choice ignored; turn in flight ({})", state.status);
                return Ok(TurnOutcome::Ignored(IgnoreReason::TurnInFlight));
            }
            let Some(session) = state.session.clone() else {
                return Ok(TurnOutcome::Ignored(IgnoreReason::NoSession));
            };
            if !session.offers(option) {
                return Err(ChronosError::InvalidChoice(option.label.clone()).into());
            }
            state.status = TurnStatus::AwaitingStory;
            state.display_image = None;
            session
        };
        let _guard = TurnGuard { engine: self };

        let choice_text = option.choice_text();
        tracing::info!("Turn {}: {}", session.turn() + 1, option.label);

        let payload = self
            .oracle
            .continue_session(&session.context(), &choice_text)
            .await
            .map_err(|e| {
                tracing::error!("Story continuation failed: {:#}", e);
                e
            })?;
        let next = Arc::new(session.advance(payload).map_err(|e| {
            tracing::error!("Story continuation rejected: {:#}", e);
            e
        })?);

        self.commit(Arc::clone(&next), false);
        Ok(self.paint_scene(&next).await)
    }

    /// Choose by zero-based position among the current options
    ///
    /// # Errors
    ///
    /// Returns `InvalidChoice` when `index` is out of range, otherwise as
    /// [`choose_option`](Self::choose_option)
    pub async fn choose_index(&self, index: usize) -> Result<TurnOutcome> {
        let Some(session) = self.session() else {
            return Ok(TurnOutcome::Ignored(IgnoreReason::NoSession));
        };
        let option = session
            .options()
            .get(index)
            .cloned()
            .ok_or_else(|| ChronosError::InvalidChoice(format!("no option {}", index + 1)))?;
        self.choose_option(&option).await
    }

    /// Discard the session, its scene image, and the companion log
    ///
    /// Returns false (and changes nothing) while a turn is in flight.
    pub fn restart(&self) -> bool {
        let mut state = self.state();
        if state.status != TurnStatus::Idle {
            tracing::debug!("Restart ignored; turn in flight ({})", state.status);
            return false;
        }
        state.session = None;
        state.display_image = None;
        state.epoch += 1;
        self.snapshots.send_replace(SessionSnapshot {
            epoch: state.epoch,
            session: None,
        });
        tracing::info!("Session discarded");
        true
    }

    fn commit(&self, session: Arc<Session>, new_session: bool) {
        let mut state = self.state();
        if new_session {
            state.epoch += 1;
        }
        state.session = Some(Arc::clone(&session));
        state.status = TurnStatus::AwaitingImage;
        self.snapshots.send_replace(SessionSnapshot {
            epoch: state.epoch,
            session: Some(session),
        });
        tracing::debug!("Turn status: {} -> {}", TurnStatus::AwaitingStory, state.status);
    }

    async fn paint_scene(&self, session: &Session) -> TurnOutcome {
        let resolution = self.resolution();
        let result = self
            .oracle
            .generate_image(session.image_prompt(), session.visual_style(), resolution)
            .await;

        match result {
            Ok(Some(image)) => {
                tracing::info!(
                    "Scene {} painted ({} bytes, {})",
                    session.turn(),
                    image.data.len(),
                    resolution
                );
                self.state().display_image = Some(DisplayImage {
                    turn: session.turn(),
                    image,
                });
                TurnOutcome::Completed { image_ready: true }
            }
            Ok(None) => {
                tracing::warn!("No scene image for turn {}", session.turn());
                TurnOutcome::Completed { image_ready: false }
            }
            Err(e) if is_credential_invalidated(&e) => {
                tracing::warn!("Credential invalidated while painting scene");
                TurnOutcome::CredentialRevoked
            }
            Err(e) => {
                tracing::warn!("Scene image failed: {:#}", e);
                TurnOutcome::Completed { image_ready: false }
            }
        }
    }
}

impl fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("GameEngine")
            .field("status", &state.status)
            .field("turn", &state.session.as_ref().map(|s| s.turn()))
            .field("resolution", &state.resolution)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::provider::MockCredentialProvider;
    use crate::credentials::{CredentialGate, GateState};
    use crate::oracle::GatedOracle;
    use crate::test_utils::{
        assert_error_contains, sample_image, sample_options, sample_payload, ScriptedOracle,
    };
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, assert_ready, task};

    fn engine_with(oracle: Arc<ScriptedOracle>) -> GameEngine {
        GameEngine::new(oracle, ImageResolution::R1K)
    }

    async fn started(oracle: &Arc<ScriptedOracle>) -> GameEngine {
        oracle.push_story(Ok(sample_payload("You wake in a crypt.")));
        let engine = engine_with(Arc::clone(oracle));
        engine.start_game("Dark Fantasy", "Oil Painting").await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_start_game_creates_session() {
        let oracle = Arc::new(ScriptedOracle::new());
        let mut payload = sample_payload("You wake in a crypt.");
        payload.inventory = vec![];
        payload.image_prompt = "crypt".into();
        oracle.push_story(Ok(payload));
        oracle.push_image(Ok(Some(sample_image())));

        let engine = engine_with(Arc::clone(&oracle));
        let outcome = engine.start_game("Dark Fantasy", "Oil Painting").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Completed { image_ready: true });
        assert_eq!(engine.status(), TurnStatus::Idle);
        let session = engine.session().unwrap();
        assert_eq!(session.history(), ["You wake in a crypt.".to_string()]);
        assert_eq!(session.visual_style(), "Oil Painting");
        assert!(session.inventory().is_empty());
        assert_eq!(engine.display_image().unwrap().turn, 1);

        let (prompt, style, resolution) = oracle.last_image_request().unwrap();
        assert_eq!(prompt, "crypt");
        assert_eq!(style, "Oil Painting");
        assert_eq!(resolution, ImageResolution::R1K);
    }

    #[tokio::test]
    async fn test_start_game_failure_leaves_no_session() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_story(Err(ChronosError::Oracle("503".into()).into()));

        let engine = engine_with(Arc::clone(&oracle));
        assert_error_contains(engine.start_game("Cyberpunk", "Dark Noir").await, "503");

        assert_eq!(engine.status(), TurnStatus::Idle);
        assert!(engine.session().is_none());
        assert_eq!(oracle.image_calls(), 0);
    }

    #[tokio::test]
    async fn test_start_game_twice_is_rejected() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = started(&oracle).await;

        let err = engine.start_game("Cyberpunk", "Dark Noir").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChronosError>(),
            Some(ChronosError::SessionExists)
        ));
        assert_eq!(oracle.story_calls(), 1);
    }

    #[tokio::test]
    async fn test_choose_option_appends_history() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = started(&oracle).await;
        let before = engine.session().unwrap();

        oracle.push_story(Ok(sample_payload("The door creaks open.")));
        let option = before.options()[1].clone();
        let outcome = engine.choose_option(&option).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Completed { image_ready: false });
        let after = engine.session().unwrap();
        assert_eq!(after.history().len(), before.history().len() + 1);
        assert_eq!(after.history().last().unwrap(), "The door creaks open.");
        assert_eq!(after.visual_style(), before.visual_style());
        assert_eq!(after.options().len(), 4);

        let (context, choice_text) = oracle.last_continuation().unwrap();
        assert_eq!(choice_text, "Option 2: Do thing 2");
        assert_eq!(context.recent_history, ["You wake in a crypt."]);
        assert_eq!(context.visual_style, "Oil Painting");
    }

    #[tokio::test]
    async fn test_three_option_payload_leaves_session_unchanged() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = started(&oracle).await;
        let before = engine.session().unwrap();

        let mut payload = sample_payload("Broken scene");
        payload.options = sample_options(3);
        oracle.push_story(Ok(payload));

        let err = engine.choose_index(0).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChronosError>(),
            Some(ChronosError::MalformedPayload(_))
        ));
        assert_eq!(engine.session().unwrap(), before);
        assert_eq!(engine.status(), TurnStatus::Idle);
        assert_eq!(oracle.image_calls(), 1);
    }

    #[tokio::test]
    async fn test_story_failure_keeps_previous_session() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = started(&oracle).await;
        let before = engine.session().unwrap();

        oracle.push_story(Err(ChronosError::Oracle("timeout".into()).into()));
        assert!(engine.choose_index(3).await.is_err());

        assert_eq!(engine.session().unwrap(), before);
        assert_eq!(engine.status(), TurnStatus::Idle);
    }

    #[tokio::test]
    async fn test_choose_unknown_option_is_rejected() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = started(&oracle).await;

        let bogus = ChoiceDescriptor::new("Fly", "Leave by air");
        let err = engine.choose_option(&bogus).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChronosError>(),
            Some(ChronosError::InvalidChoice(_))
        ));
        assert!(engine.choose_index(4).await.is_err());
        assert_eq!(oracle.story_calls(), 1);
        assert_eq!(engine.status(), TurnStatus::Idle);
    }

    #[tokio::test]
    async fn test_choose_without_session_is_ignored() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = engine_with(Arc::clone(&oracle));

        let option = sample_options(1).remove(0);
        assert_eq!(
            engine.choose_option(&option).await.unwrap(),
            TurnOutcome::Ignored(IgnoreReason::NoSession)
        );
        assert_eq!(oracle.story_calls(), 0);
    }

    #[tokio::test]
    async fn test_choose_while_awaiting_story_is_ignored() {
        let gate = Arc::new(Notify::new());
        let oracle = Arc::new(ScriptedOracle::new().with_story_gate(Arc::clone(&gate)));
        oracle.push_story(Ok(sample_payload("Opening")));
        oracle.push_story(Ok(sample_payload("Second")));
        let engine = engine_with(Arc::clone(&oracle));

        gate.notify_one();
        engine.start_game("Space Opera", "Hyper-Realistic").await.unwrap();
        let before = engine.session().unwrap();

        let mut turn = task::spawn(engine.choose_index(0));
        assert_pending!(turn.poll());
        assert_eq!(engine.status(), TurnStatus::AwaitingStory);

        let second = engine.choose_index(1).await.unwrap();
        assert_eq!(second, TurnOutcome::Ignored(IgnoreReason::TurnInFlight));
        assert_eq!(engine.session().unwrap(), before);
        assert_eq!(engine.status(), TurnStatus::AwaitingStory);
        assert!(!engine.restart());

        gate.notify_one();
        let outcome = assert_ready!(turn.poll()).unwrap();
        assert_eq!(outcome, TurnOutcome::Completed { image_ready: false });
        assert_eq!(oracle.story_calls(), 2);
        assert_eq!(engine.session().unwrap().turn(), 2);
    }

    #[tokio::test]
    async fn test_image_requested_after_story_applied() {
        let gate = Arc::new(Notify::new());
        let oracle = Arc::new(ScriptedOracle::new().with_image_gate(Arc::clone(&gate)));
        oracle.push_story(Ok(sample_payload("Opening")));
        oracle.push_image(Ok(Some(sample_image())));
        let engine = engine_with(Arc::clone(&oracle));

        let mut turn = task::spawn(engine.start_game("Cyberpunk", "Cyberpunk Neon"));
        assert_pending!(turn.poll());

        assert_eq!(engine.status(), TurnStatus::AwaitingImage);
        assert_eq!(engine.session().unwrap().story_text(), "Opening");
        assert!(engine.display_image().is_none());
        assert_eq!(engine.snapshot().session.unwrap().story_text(), "Opening");

        gate.notify_one();
        let outcome = assert_ready!(turn.poll()).unwrap();
        assert_eq!(outcome, TurnOutcome::Completed { image_ready: true });
        assert!(engine.display_image().is_some());
    }

    #[tokio::test]
    async fn test_choose_clears_display_image_immediately() {
        let gate = Arc::new(Notify::new());
        let oracle = Arc::new(ScriptedOracle::new().with_story_gate(Arc::clone(&gate)));
        oracle.push_story(Ok(sample_payload("Opening")));
        oracle.push_image(Ok(Some(sample_image())));
        let engine = engine_with(Arc::clone(&oracle));

        gate.notify_one();
        engine.start_game("High Fantasy", "Studio Ghibli").await.unwrap();
        assert!(engine.display_image().is_some());

        oracle.push_story(Ok(sample_payload("Next")));
        let mut turn = task::spawn(engine.choose_index(2));
        assert_pending!(turn.poll());
        assert!(engine.display_image().is_none());

        gate.notify_one();
        assert_ready!(turn.poll()).unwrap();
    }

    #[tokio::test]
    async fn test_dropped_turn_returns_to_idle() {
        let gate = Arc::new(Notify::new());
        let oracle = Arc::new(ScriptedOracle::new().with_story_gate(Arc::clone(&gate)));
        let engine = engine_with(Arc::clone(&oracle));

        {
            let mut turn = task::spawn(engine.start_game("Cthulhu Mythos", "Dark Noir"));
            assert_pending!(turn.poll());
            assert_eq!(engine.status(), TurnStatus::AwaitingStory);
        }

        assert_eq!(engine.status(), TurnStatus::Idle);
        assert!(engine.session().is_none());
    }

    #[tokio::test]
    async fn test_image_without_inline_data_completes_without_image() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_story(Ok(sample_payload("Opening")));
        oracle.push_image(Ok(None));
        let engine = engine_with(Arc::clone(&oracle));

        let outcome = engine.start_game("Dark Fantasy", "Oil Painting").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Completed { image_ready: false });
        assert_eq!(engine.status(), TurnStatus::Idle);
        assert!(engine.display_image().is_none());
        assert!(engine.session().is_some());
    }

    #[tokio::test]
    async fn test_image_failure_degrades() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_story(Ok(sample_payload("Opening")));
        oracle.push_image(Err(ChronosError::Oracle("500".into()).into()));
        let engine = engine_with(Arc::clone(&oracle));

        let outcome = engine.start_game("Dark Fantasy", "Oil Painting").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Completed { image_ready: false });
        assert!(engine.session().is_some());
    }

    #[tokio::test]
    async fn test_credential_invalidated_keeps_story_and_blocks_gate() {
        let mut provider = MockCredentialProvider::new();
        provider.expect_check_existing().returning(|| Ok(true));
        let credential_gate = Arc::new(CredentialGate::new(Arc::new(provider)));
        credential_gate.enter().await;

        let scripted = Arc::new(ScriptedOracle::new());
        scripted.push_story(Ok(sample_payload("Opening")));
        scripted.push_story(Ok(sample_payload("The vault opens.")));
        scripted.push_image(Ok(Some(sample_image())));
        scripted.push_image(Err(ChronosError::CredentialInvalidated.into()));

        let gated = GatedOracle::new(scripted.clone(), Arc::clone(&credential_gate));
        let engine = GameEngine::new(Arc::new(gated), ImageResolution::R2K);
        engine.start_game("Space Opera", "Oil Painting").await.unwrap();

        let outcome = engine.choose_index(0).await.unwrap();

        assert_eq!(outcome, TurnOutcome::CredentialRevoked);
        assert_eq!(engine.status(), TurnStatus::Idle);
        assert_eq!(engine.session().unwrap().story_text(), "The vault opens.");
        assert!(engine.display_image().is_none());
        assert_eq!(credential_gate.state(), GateState::Blocked);

        let err = engine.choose_index(0).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChronosError>(),
            Some(ChronosError::CredentialGateBlocked)
        ));
        assert_eq!(scripted.story_calls(), 2);
    }

    #[tokio::test]
    async fn test_resolution_applies_to_next_image_call() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = started(&oracle).await;

        engine.set_resolution(ImageResolution::R4K);
        oracle.push_story(Ok(sample_payload("Next")));
        engine.choose_index(0).await.unwrap();

        let (_, _, resolution) = oracle.last_image_request().unwrap();
        assert_eq!(resolution, ImageResolution::R4K);
        assert_eq!(engine.resolution(), ImageResolution::R4K);
    }

    #[tokio::test]
    async fn test_restart_discards_session_and_bumps_epoch() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_image(Ok(Some(sample_image())));
        let engine = started(&oracle).await;
        let mut rx = engine.subscribe();
        let epoch = rx.borrow_and_update().epoch;

        assert!(engine.restart());

        assert!(engine.session().is_none());
        assert!(engine.display_image().is_none());
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.epoch, epoch + 1);
        assert!(snapshot.session.is_none());

        oracle.push_story(Ok(sample_payload("A fresh start")));
        engine.start_game("Wild West Steampunk", "Vibrant Watercolor").await.unwrap();
        assert_eq!(engine.session().unwrap().history(), ["A fresh start".to_string()]);
        assert_eq!(engine.snapshot().epoch, epoch + 2);
    }

    #[tokio::test]
    async fn test_continuation_keeps_epoch() {
        let oracle = Arc::new(ScriptedOracle::new());
        let engine = started(&oracle).await;
        let epoch = engine.snapshot().epoch;

        oracle.push_story(Ok(sample_payload("Next")));
        engine.choose_index(0).await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.epoch, epoch);
        assert_eq!(snapshot.session.unwrap().turn(), 2);
    }
}
