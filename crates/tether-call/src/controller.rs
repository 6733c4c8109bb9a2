// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call session controller.
//!
//! Every user-initiated entry point checks, in order: network reachability,
//! microphone permission (prompting inline), and a stored session token.
//! A failed check shows an alert and aborts with the matching error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tether_config::model::{BusyPolicy, CallConfig};
use tether_core::types::{
    ActiveCallParams, AlertKind, CallRecord, EngineEvent, PermissionKind, UserAlert, keys,
};
use tether_core::{
    AlertSink, CallIntent, CallSignalingApi, KeyValueStore, NetworkMonitor, PermissionGate, Route,
    SessionToken, TetherError, VoiceEngine, VoiceEngineFactory,
};
use tether_router::NavigationRouter;

use crate::events::{self, EngineListenerHandle};
use crate::session::{CallSession, CallState, StartedCall};

/// Uid passed to the engine; `0` lets the voice service assign one.
const AUTO_UID: u32 = 0;

/// Collaborators the controller needs.
#[derive(Clone)]
pub struct CallDeps {
    pub store: Arc<dyn KeyValueStore>,
    pub api: Arc<dyn CallSignalingApi>,
    pub engine_factory: Arc<dyn VoiceEngineFactory>,
    pub permissions: Arc<dyn PermissionGate>,
    pub network: Arc<dyn NetworkMonitor>,
    pub alerts: Arc<dyn AlertSink>,
}

struct Inner {
    deps: CallDeps,
    config: CallConfig,
    engine: tokio::sync::Mutex<Option<Arc<dyn VoiceEngine>>>,
    engine_events: Mutex<Option<EngineListenerHandle>>,
    session: Mutex<Option<CallSession>>,
    state: watch::Sender<CallState>,
    generation: AtomicU64,
}

/// Owns the voice engine and the single live call session.
///
/// Cheap to clone; clones share the same engine and session.
#[derive(Clone)]
pub struct CallSessionController {
    inner: Arc<Inner>,
}

/// Non-owning controller reference held by background tasks.
#[derive(Clone)]
pub(crate) struct WeakController(Weak<Inner>);

impl WeakController {
    pub fn upgrade(&self) -> Option<CallSessionController> {
        self.0.upgrade().map(|inner| CallSessionController { inner })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn superseded(generation: u64) -> TetherError {
    TetherError::Internal(format!("call session {generation} was superseded"))
}

fn non_empty(channel: String) -> Option<String> {
    if channel.is_empty() { None } else { Some(channel) }
}

impl CallSessionController {
    pub fn new(config: CallConfig, deps: CallDeps) -> Self {
        let (state, _) = watch::channel(CallState::Idle);
        Self {
            inner: Arc::new(Inner {
                deps,
                config,
                engine: tokio::sync::Mutex::new(None),
                engine_events: Mutex::new(None),
                session: Mutex::new(None),
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    fn downgrade(&self) -> WeakController {
        WeakController(Arc::downgrade(&self.inner))
    }

    pub fn state(&self) -> CallState {
        *self.inner.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<CallState> {
        self.inner.state.subscribe()
    }

    /// Channel of the live session, once signaling assigned one.
    pub fn current_channel(&self) -> Option<String> {
        lock(&self.inner.session)
            .as_ref()
            .and_then(|s| non_empty(s.channel_id.clone()))
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.inner.session)
            .as_ref()
            .is_some_and(|s| s.connected)
    }

    /// Whether the engine event listener is running.
    pub fn is_listening(&self) -> bool {
        lock(&self.inner.engine_events)
            .as_ref()
            .is_some_and(EngineListenerHandle::is_active)
    }

    fn set_state(&self, state: CallState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "call state changed");
        }
    }

    /// Constructs and initializes the voice engine if it does not exist.
    pub async fn init(&self) -> bool {
        match self.ensure_engine().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "voice engine initialization failed");
                false
            }
        }
    }

    async fn ensure_engine(&self) -> Result<Arc<dyn VoiceEngine>, TetherError> {
        let mut slot = self.inner.engine.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let app_id = self
            .inner
            .config
            .app_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| TetherError::Config("call.app_id is not configured".into()))?;

        let engine = self.inner.deps.engine_factory.create().await?;
        let setup = async {
            engine.initialize(app_id).await?;
            engine.enable_audio().await
        };
        if let Err(e) = setup.await {
            if let Err(release) = engine.release().await {
                warn!(error = %release, "releasing half-initialized engine failed");
            }
            return Err(e);
        }

        *lock(&self.inner.engine_events) = Some(events::spawn(engine.as_ref(), self.downgrade()));
        *slot = Some(Arc::clone(&engine));
        info!("voice engine initialized");
        Ok(engine)
    }

    /// Places an outgoing call to `receiver_id`.
    ///
    /// Returns once the channel join is issued. The connect watchdog ends
    /// the call if it is not connected within `call.connect_timeout_secs`.
    pub async fn start_call(&self, receiver_id: &str) -> Result<StartedCall, TetherError> {
        let session = self.check_preconditions().await?;
        let generation = self.begin_session(true).await?;
        info!(receiver_id, generation, "starting call");

        let result = self.connect_outgoing(generation, &session, receiver_id).await;
        if let Err(e) = &result {
            self.abandon(generation, e, true).await;
        }
        result
    }

    async fn connect_outgoing(
        &self,
        generation: u64,
        session: &SessionToken,
        receiver_id: &str,
    ) -> Result<StartedCall, TetherError> {
        let initiated = self.inner.deps.api.initiate_call(session, receiver_id).await?;
        self.with_current(generation, |s| {
            s.channel_id = initiated.channel_name.clone();
        })?;

        let engine = self.ensure_engine().await?;
        self.with_current(generation, |_| ())?;
        self.set_state(CallState::Joining);
        engine
            .join_channel(&initiated.token, &initiated.channel_name, AUTO_UID)
            .await?;
        self.confirm_joined(generation, engine.as_ref()).await?;
        self.arm_watchdog(generation);

        Ok(StartedCall {
            channel_id: initiated.channel_name,
            token: initiated.token,
            generation,
        })
    }

    /// Joins an existing channel, typically an accepted incoming call.
    /// Returns the media token. No watchdog is armed.
    pub async fn join_call(&self, channel_id: &str) -> Result<String, TetherError> {
        let session = self.check_preconditions().await?;
        let generation = self.begin_session(false).await?;
        self.with_current(generation, |s| s.channel_id = channel_id.to_string())?;
        info!(channel_id, generation, "joining call");

        let result = self.connect_incoming(generation, &session, channel_id).await;
        if let Err(e) = &result {
            self.abandon(generation, e, false).await;
        }
        result
    }

    async fn connect_incoming(
        &self,
        generation: u64,
        session: &SessionToken,
        channel_id: &str,
    ) -> Result<String, TetherError> {
        let token = self.inner.deps.api.join_token(session, channel_id).await?;
        let engine = self.ensure_engine().await?;
        self.with_current(generation, |_| ())?;
        self.set_state(CallState::Joining);
        engine.join_channel(&token, channel_id, AUTO_UID).await?;
        self.confirm_joined(generation, engine.as_ref()).await?;
        Ok(token)
    }

    /// Fails when `generation` ended while its join was in flight. The
    /// engine leaves again unless a newer session already owns it.
    async fn confirm_joined(
        &self,
        generation: u64,
        engine: &dyn VoiceEngine,
    ) -> Result<(), TetherError> {
        let idle = {
            let slot = lock(&self.inner.session);
            match slot.as_ref() {
                Some(s) if s.generation == generation => return Ok(()),
                other => other.is_none(),
            }
        };
        info!(generation, "call ended while joining, leaving channel");
        if idle {
            if let Err(e) = engine.leave_channel().await {
                warn!(error = %e, "leaving voice channel failed");
            }
        }
        Err(superseded(generation))
    }

    /// Joins the call described by `intent` and opens the active-call screen.
    pub async fn accept_incoming_call(
        &self,
        intent: &CallIntent,
        router: &NavigationRouter,
    ) -> Result<ActiveCallParams, TetherError> {
        if intent.channel_id.is_empty() {
            return Err(TetherError::MalformedPayload(
                "incoming call has no channel".into(),
            ));
        }
        let token = self.join_call(&intent.channel_id).await?;
        let params = ActiveCallParams {
            channel_id: intent.channel_id.clone(),
            recipient_name: intent.display_name().to_string(),
            is_incoming: true,
            token: Some(token),
        };
        let value =
            serde_json::to_value(&params).map_err(|e| TetherError::Internal(e.to_string()))?;
        router.navigate(Route::ActiveCall, value);
        Ok(params)
    }

    /// Marks session `generation` connected and disarms its watchdog.
    /// Idempotent; `false` when nothing changed, including when `generation`
    /// has ended or been replaced.
    pub fn set_call_connected(&self, generation: u64) -> bool {
        self.connect_if(|s| s.generation == generation)
    }

    fn connect_if(&self, matches: impl FnOnce(&CallSession) -> bool) -> bool {
        let changed = {
            let mut slot = lock(&self.inner.session);
            match slot.as_mut() {
                Some(s) if !s.connected && matches(s) => {
                    s.connected = true;
                    s.disarm_watchdog();
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.set_state(CallState::Connected);
            info!("call connected");
        }
        changed
    }

    /// Ends the live session, if any, and leaves the channel.
    ///
    /// With `channel_id`, the backend is told the call ended; failures there
    /// are logged. Safe to call repeatedly.
    pub async fn end_call(&self, channel_id: Option<&str>) {
        let ended = lock(&self.inner.session).take();
        self.finish(ended, channel_id.map(str::to_string)).await;
    }

    /// Ends the session only if it is still `generation`.
    async fn end_generation(&self, generation: u64, channel_id: Option<String>) {
        let ended = {
            let mut slot = lock(&self.inner.session);
            if slot.as_ref().is_some_and(|s| s.generation == generation) {
                slot.take()
            } else {
                None
            }
        };
        if ended.is_some() {
            self.finish(ended, channel_id).await;
        }
    }

    async fn finish(&self, ended: Option<CallSession>, channel_id: Option<String>) {
        let mut ended = ended;
        if let Some(session) = ended.as_mut() {
            session.disarm_watchdog();
        }

        let engine = self.inner.engine.lock().await.clone();
        if let Some(engine) = engine {
            if let Err(e) = engine.leave_channel().await {
                warn!(error = %e, "leaving voice channel failed");
            }
        }

        if let Some(channel_id) = channel_id.and_then(non_empty) {
            match self.session_token().await {
                Ok(Some(session)) => {
                    if let Err(e) = self.inner.deps.api.end_call(&session, &channel_id).await {
                        warn!(channel_id = %channel_id, error = %e, "call end notification failed");
                    }
                }
                Ok(None) => debug!("no session token, skipping call end notification"),
                Err(e) => warn!(error = %e, "could not read session token"),
            }
        }

        if let Some(session) = ended {
            info!(
                generation = session.generation,
                outgoing = session.outgoing,
                connected = session.connected,
                "call ended"
            );
            self.set_state(CallState::Ended);
        }
    }

    /// Leaves, releases and drops the engine. The next call constructs a new one.
    pub async fn destroy_engine(&self) {
        let ended = lock(&self.inner.session).take();
        if let Some(mut session) = ended {
            session.disarm_watchdog();
            self.set_state(CallState::Ended);
        }

        let engine = self.inner.engine.lock().await.take();
        drop(lock(&self.inner.engine_events).take());

        if let Some(engine) = engine {
            if let Err(e) = engine.leave_channel().await {
                warn!(error = %e, "leaving voice channel failed");
            }
            if let Err(e) = engine.release().await {
                warn!(error = %e, "releasing voice engine failed");
            }
            info!("voice engine released");
        }
    }

    pub async fn call_history(&self) -> Result<Vec<CallRecord>, TetherError> {
        let session = self
            .session_token()
            .await?
            .ok_or(TetherError::Unauthenticated)?;
        self.inner.deps.api.call_history(&session).await
    }

    pub(crate) async fn handle_engine_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::JoinSuccess { channel, uid } => {
                debug!(channel_id = %channel, uid, "joined voice channel");
                if !self.connect_if(|s| s.channel_id == channel) {
                    debug!(channel_id = %channel, "join success for a finished session ignored");
                }
            }
            EngineEvent::RemoteJoined { uid } => debug!(uid, "remote party joined"),
            EngineEvent::RemoteLeft { uid } => {
                if self.is_connected() {
                    info!(uid, "remote party left, ending call");
                    let channel = self.current_channel();
                    self.end_call(channel.as_deref()).await;
                }
            }
            EngineEvent::Error { code, message } => {
                warn!(code, message = %message, "voice engine error");
            }
        }
    }

    async fn check_preconditions(&self) -> Result<SessionToken, TetherError> {
        let deps = &self.inner.deps;
        if !deps.network.is_reachable().await {
            return Err(self.alerted(TetherError::NetworkUnreachable));
        }

        let mut status = deps.permissions.check(PermissionKind::Microphone).await;
        if !status.is_granted() {
            status = deps.permissions.request(PermissionKind::Microphone).await;
        }
        if !status.is_granted() {
            return Err(self.alerted(TetherError::PermissionDenied {
                permission: PermissionKind::Microphone,
            }));
        }

        match self.session_token().await? {
            Some(session) => Ok(session),
            None => Err(self.alerted(TetherError::Unauthenticated)),
        }
    }

    async fn session_token(&self) -> Result<Option<SessionToken>, TetherError> {
        Ok(self
            .inner
            .deps
            .store
            .get(keys::SESSION_TOKEN)
            .await?
            .filter(|t| !t.is_empty())
            .map(SessionToken::new))
    }

    fn alerted(&self, err: TetherError) -> TetherError {
        if let Some(alert) = err.alert() {
            self.inner.deps.alerts.show(alert);
        }
        err
    }

    /// Applies the busy policy and installs a fresh session.
    async fn begin_session(&self, outgoing: bool) -> Result<u64, TetherError> {
        let live = lock(&self.inner.session)
            .as_ref()
            .map(|s| s.channel_id.clone());
        if let Some(channel_id) = live {
            match self.inner.config.busy_policy {
                BusyPolicy::Reject => {
                    return Err(self.alerted(TetherError::CallInProgress { channel_id }));
                }
                BusyPolicy::EndPrevious => {
                    info!(channel_id = %channel_id, "ending previous call for new session");
                    self.end_call(non_empty(channel_id).as_deref()).await;
                }
            }
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.inner.session) = Some(CallSession::new(generation, outgoing));
        self.set_state(CallState::Initializing);
        Ok(generation)
    }

    fn with_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut CallSession) -> R,
    ) -> Result<R, TetherError> {
        match lock(&self.inner.session).as_mut() {
            Some(s) if s.generation == generation => Ok(f(s)),
            _ => Err(superseded(generation)),
        }
    }

    /// Tears down a session whose setup failed. Sessions already replaced
    /// or ended are left alone.
    async fn abandon(&self, generation: u64, err: &TetherError, notify_backend: bool) {
        let Ok(channel_id) = self.with_current(generation, |s| s.channel_id.clone()) else {
            debug!(generation, "setup of a superseded session stopped");
            return;
        };
        warn!(generation, error = %err, "call setup failed");
        let alert = err.alert().unwrap_or_else(|| {
            UserAlert::new(
                AlertKind::CallFailed,
                "Call failed",
                "The call could not be connected. Please try again.",
            )
        });
        self.inner.deps.alerts.show(alert);
        let channel_id = if notify_backend { non_empty(channel_id) } else { None };
        self.end_generation(generation, channel_id).await;
    }

    fn arm_watchdog(&self, generation: u64) {
        let cancel = CancellationToken::new();
        let armed = self
            .with_current(generation, |s| {
                if s.connected {
                    false
                } else {
                    s.watchdog = Some(cancel.clone());
                    true
                }
            })
            .unwrap_or(false);
        if !armed {
            return;
        }

        let controller = self.downgrade();
        let timeout = self.inner.config.connect_timeout();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    if let Some(controller) = controller.upgrade() {
                        controller.on_connect_timeout(generation, timeout).await;
                    }
                }
            }
        });
    }

    async fn on_connect_timeout(&self, generation: u64, timeout: Duration) {
        let Ok(Some(channel_id)) = self.with_current(generation, |s| {
            if s.connected { None } else { Some(s.channel_id.clone()) }
        }) else {
            return;
        };
        warn!(channel_id = %channel_id, timeout_secs = timeout.as_secs(), "callee did not answer, ending call");
        self.inner.deps.alerts.show(UserAlert::new(
            AlertKind::NoAnswer,
            "No answer",
            "The person you called did not answer.",
        ));
        self.end_generation(generation, non_empty(channel_id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_core::types::PermissionStatus;
    use tether_test_utils::{
        MemoryStore, MockBackend, MockNavigator, MockNetwork, MockPermissions, MockVoiceEngine,
        MockVoiceEngineFactory, RecordingAlerts,
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        backend: Arc<MockBackend>,
        factory: Arc<MockVoiceEngineFactory>,
        engine: Arc<MockVoiceEngine>,
        permissions: Arc<MockPermissions>,
        network: Arc<MockNetwork>,
        alerts: Arc<RecordingAlerts>,
        controller: CallSessionController,
    }

    fn config() -> CallConfig {
        CallConfig {
            app_id: Some("voice-app".into()),
            ..CallConfig::default()
        }
    }

    fn fixture_with(config: CallConfig) -> Fixture {
        let store = Arc::new(MemoryStore::with_entries([(keys::SESSION_TOKEN, "sess")]));
        let backend = Arc::new(MockBackend::new());
        let factory = Arc::new(MockVoiceEngineFactory::new());
        let engine = factory.engine();
        let permissions = Arc::new(MockPermissions::granting());
        let network = Arc::new(MockNetwork::online());
        let alerts = Arc::new(RecordingAlerts::new());
        let controller = CallSessionController::new(
            config,
            CallDeps {
                store: store.clone(),
                api: backend.clone(),
                engine_factory: factory.clone(),
                permissions: permissions.clone(),
                network: network.clone(),
                alerts: alerts.clone(),
            },
        );
        Fixture {
            store,
            backend,
            factory,
            engine,
            permissions,
            network,
            alerts,
            controller,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(config())
    }

    /// Gives spawned listener and watchdog tasks a chance to run.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn init_builds_engine_once() {
        let f = fixture();
        assert!(f.controller.init().await);
        assert!(f.controller.init().await);

        assert_eq!(f.factory.created(), 1);
        assert_eq!(f.engine.initialize_count(), 1);
        assert!(f
            .engine
            .calls()
            .contains(&tether_test_utils::EngineCall::EnableAudio));
        assert!(f.controller.is_listening());
    }

    #[tokio::test]
    async fn init_without_app_id_fails() {
        let f = fixture_with(CallConfig::default());
        assert!(!f.controller.init().await);
        assert_eq!(f.factory.created(), 0);
    }

    #[tokio::test]
    async fn failed_initialize_releases_engine() {
        let f = fixture();
        f.engine.set_initialize_failure(true);
        assert!(!f.controller.init().await);
        assert_eq!(f.engine.release_count(), 1);
    }

    #[tokio::test]
    async fn start_call_offline_never_initiates() {
        let f = fixture();
        f.network.set_reachable(false);

        let err = f.controller.start_call("guardian-1").await.unwrap_err();
        assert!(matches!(err, TetherError::NetworkUnreachable));
        assert!(f.backend.initiated().is_empty());
        assert_eq!(f.alerts.kinds(), vec![AlertKind::NetworkUnreachable]);
        assert_eq!(f.controller.state(), CallState::Idle);
    }

    #[tokio::test]
    async fn denied_microphone_aborts_with_alert() {
        let f = fixture();
        f.permissions.set_answer(PermissionStatus::Denied);

        let err = f.controller.start_call("guardian-1").await.unwrap_err();
        assert!(matches!(
            err,
            TetherError::PermissionDenied {
                permission: PermissionKind::Microphone
            }
        ));
        assert_eq!(f.permissions.prompts(), 1);
        assert_eq!(f.alerts.kinds(), vec![AlertKind::PermissionDenied]);
        assert!(f.backend.initiated().is_empty());
    }

    #[tokio::test]
    async fn missing_session_asks_to_log_in_again() {
        let f = fixture();
        f.store.remove(keys::SESSION_TOKEN).await.unwrap();

        let err = f.controller.join_call("chan-x").await.unwrap_err();
        assert!(matches!(err, TetherError::Unauthenticated));
        assert_eq!(f.alerts.kinds(), vec![AlertKind::Unauthenticated]);
        assert!(f.backend.joined().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_call_initiates_and_joins() {
        let f = fixture();
        let started = f.controller.start_call("guardian-1").await.unwrap();

        assert_eq!(started.channel_id, "chan-guardian-1");
        assert_eq!(started.token, "media-guardian-1");
        assert_eq!(f.backend.initiated(), vec!["guardian-1"]);
        assert_eq!(f.engine.joined_channels(), vec!["chan-guardian-1"]);
        assert_eq!(f.controller.state(), CallState::Joining);
        assert_eq!(f.controller.current_channel().as_deref(), Some("chan-guardian-1"));
        assert_eq!(f.backend.sessions_seen(), vec!["sess"]);
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_ends_unanswered_call_exactly_once() {
        let f = fixture();
        let started = f.controller.start_call("guardian-1").await.unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        settle().await;
        assert!(f.backend.ended().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(f.backend.ended(), vec!["chan-guardian-1"]);
        assert_eq!(f.alerts.kinds(), vec![AlertKind::NoAnswer]);
        assert_eq!(f.controller.state(), CallState::Ended);
        assert_eq!(f.engine.leave_count(), 1);

        // A connect after the forced end changes nothing.
        f.engine.emit(EngineEvent::JoinSuccess {
            channel: "chan-guardian-1".into(),
            uid: 5,
        });
        settle().await;
        assert!(!f.controller.set_call_connected(started.generation));
        assert_eq!(f.controller.state(), CallState::Ended);

        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(f.backend.ended().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn join_success_disarms_watchdog() {
        let f = fixture();
        let started = f.controller.start_call("guardian-1").await.unwrap();

        f.engine.emit(EngineEvent::JoinSuccess {
            channel: "chan-guardian-1".into(),
            uid: 1,
        });
        settle().await;
        assert_eq!(f.controller.state(), CallState::Connected);
        assert!(f.controller.is_connected());
        assert!(!f.controller.set_call_connected(started.generation));

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert!(f.backend.ended().is_empty());
        assert!(f.alerts.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn join_success_for_other_channel_is_ignored() {
        let f = fixture();
        f.controller.start_call("guardian-1").await.unwrap();
        f.engine.emit(EngineEvent::JoinSuccess {
            channel: "chan-old".into(),
            uid: 1,
        });
        settle().await;
        assert_eq!(f.controller.state(), CallState::Joining);
    }

    #[tokio::test(start_paused = true)]
    async fn end_call_is_repeatable() {
        let f = fixture();
        f.controller.start_call("guardian-1").await.unwrap();

        f.controller.end_call(Some("chan-guardian-1")).await;
        f.controller.end_call(None).await;

        assert_eq!(f.controller.state(), CallState::Ended);
        assert_eq!(f.backend.ended(), vec!["chan-guardian-1"]);
        assert_eq!(f.engine.leave_count(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert!(f.alerts.alerts().is_empty());
    }

    #[tokio::test]
    async fn end_call_swallows_backend_failure() {
        let f = fixture();
        f.backend.set_end_failure(true);
        f.controller.join_call("chan-x").await.unwrap();
        f.controller.end_call(Some("chan-x")).await;
        assert_eq!(f.controller.state(), CallState::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn new_call_ends_previous_and_old_watchdog_stays_quiet() {
        let f = fixture();
        f.controller.start_call("g1").await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        f.controller.start_call("g2").await.unwrap();
        assert_eq!(f.backend.ended(), vec!["chan-g1"]);
        assert_eq!(f.controller.current_channel().as_deref(), Some("chan-g2"));

        // Past the first call's deadline, before the second's.
        tokio::time::sleep(Duration::from_secs(25)).await;
        settle().await;
        assert_eq!(f.backend.ended(), vec!["chan-g1"]);
        assert_eq!(f.controller.state(), CallState::Joining);

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(f.backend.ended(), vec!["chan-g1", "chan-g2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_generation_cannot_connect_replacement_call() {
        let f = fixture();
        let first = f.controller.start_call("g1").await.unwrap();
        let second = f.controller.start_call("g2").await.unwrap();
        assert_ne!(first.generation, second.generation);

        assert!(!f.controller.set_call_connected(first.generation));
        assert_eq!(f.controller.state(), CallState::Joining);
        assert!(!f.controller.is_connected());

        assert!(f.controller.set_call_connected(second.generation));
        assert_eq!(f.controller.state(), CallState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn call_ended_while_joining_leaves_channel_and_fails() {
        let f = fixture();
        assert!(f.controller.init().await);
        f.engine.set_join_delay(Duration::from_secs(2));

        let controller = f.controller.clone();
        let call = tokio::spawn(async move { controller.start_call("guardian-1").await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.controller.state(), CallState::Joining);
        f.controller.end_call(Some("chan-guardian-1")).await;
        assert_eq!(f.engine.leave_count(), 1);

        let err = call.await.unwrap().unwrap_err();
        assert!(matches!(err, TetherError::Internal(_)));
        assert_eq!(f.engine.joined_channels(), vec!["chan-guardian-1"]);
        assert_eq!(f.engine.leave_count(), 2);
        assert_eq!(
            f.engine.calls().last(),
            Some(&tether_test_utils::EngineCall::Leave)
        );
        assert_eq!(f.controller.state(), CallState::Ended);
        assert_eq!(f.controller.current_channel(), None);

        // No watchdog was left behind for the abandoned join.
        tokio::time::sleep(Duration::from_secs(60)).await;
        settle().await;
        assert!(f.alerts.alerts().is_empty());
        assert_eq!(f.backend.ended(), vec!["chan-guardian-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_while_joining_keeps_engine_for_new_call() {
        let f = fixture();
        f.engine.set_join_delay(Duration::from_secs(2));

        let controller = f.controller.clone();
        let first = tokio::spawn(async move { controller.start_call("g1").await });
        tokio::time::sleep(Duration::from_secs(1)).await;

        // The replacement call also joins with a delay.
        let controller = f.controller.clone();
        let second = tokio::spawn(async move { controller.start_call("g2").await });

        assert!(first.await.unwrap().is_err());
        let started = second.await.unwrap().unwrap();
        assert_eq!(started.channel_id, "chan-g2");
        // Only the end of the first call left the channel.
        assert_eq!(f.engine.leave_count(), 1);
        assert_eq!(f.controller.current_channel().as_deref(), Some("chan-g2"));
        assert!(f.alerts.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reject_policy_refuses_second_call() {
        let f = fixture_with(CallConfig {
            busy_policy: BusyPolicy::Reject,
            ..config()
        });
        f.controller.start_call("g1").await.unwrap();

        let err = f.controller.start_call("g2").await.unwrap_err();
        assert!(matches!(err, TetherError::CallInProgress { ref channel_id } if channel_id == "chan-g1"));
        assert_eq!(f.backend.initiated(), vec!["g1"]);
        assert_eq!(f.alerts.kinds(), vec![AlertKind::CallFailed]);
    }

    #[tokio::test(start_paused = true)]
    async fn join_call_has_no_watchdog() {
        let f = fixture();
        let token = f.controller.join_call("chan-x").await.unwrap();
        assert_eq!(token, "media-chan-x");
        assert_eq!(f.engine.joined_channels(), vec!["chan-x"]);

        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(f.controller.state(), CallState::Joining);
        assert!(f.backend.ended().is_empty());
    }

    #[tokio::test]
    async fn initiate_failure_alerts_and_ends() {
        let f = fixture();
        f.backend.set_initiate_failure(true);

        let err = f.controller.start_call("g1").await.unwrap_err();
        assert!(matches!(err, TetherError::Backend { status: Some(503), .. }));
        assert_eq!(f.alerts.kinds(), vec![AlertKind::CallFailed]);
        assert_eq!(f.controller.state(), CallState::Ended);
        assert!(f.engine.joined_channels().is_empty());
        assert!(f.backend.ended().is_empty());
    }

    #[tokio::test]
    async fn engine_join_failure_notifies_backend() {
        let f = fixture();
        f.engine.set_join_failure(true);

        assert!(f.controller.start_call("g1").await.is_err());
        assert_eq!(f.backend.ended(), vec!["chan-g1"]);
        assert_eq!(f.controller.state(), CallState::Ended);
    }

    #[tokio::test]
    async fn destroy_engine_releases_and_allows_rebuild() {
        let f = fixture();
        f.controller.join_call("chan-x").await.unwrap();
        f.controller.destroy_engine().await;

        assert_eq!(f.engine.release_count(), 1);
        assert_eq!(f.controller.state(), CallState::Ended);
        assert!(!f.controller.is_listening());

        assert!(f.controller.init().await);
        assert_eq!(f.factory.created(), 2);
    }

    #[tokio::test]
    async fn destroy_engine_logs_leave_failure() {
        let f = fixture();
        f.controller.init().await;
        f.engine.set_leave_failure(true);
        f.controller.destroy_engine().await;
        assert_eq!(f.engine.release_count(), 1);
    }

    #[tokio::test]
    async fn remote_leaving_ends_connected_call() {
        let f = fixture();
        f.controller.join_call("chan-x").await.unwrap();
        f.engine.emit(EngineEvent::JoinSuccess {
            channel: "chan-x".into(),
            uid: 1,
        });
        settle().await;
        assert!(f.controller.is_connected());

        f.engine.emit(EngineEvent::RemoteLeft { uid: 2 });
        settle().await;
        assert_eq!(f.controller.state(), CallState::Ended);
        assert_eq!(f.backend.ended(), vec!["chan-x"]);
    }

    #[tokio::test]
    async fn state_changes_are_observable() {
        let f = fixture();
        let mut rx = f.controller.subscribe_state();
        f.controller.join_call("chan-x").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CallState::Joining);

        f.controller.end_call(None).await;
        assert_eq!(*rx.borrow_and_update(), CallState::Ended);
        assert!(!CallState::Ended.is_live());
    }

    #[tokio::test]
    async fn accept_incoming_call_navigates_to_active_call() {
        let f = fixture();
        let router = NavigationRouter::new();
        let nav = Arc::new(MockNavigator::new());
        router.attach(nav.clone());
        router.mark_ready();

        let intent = CallIntent {
            caller_name: String::new(),
            channel_id: "chan-in".into(),
            caller_image: None,
        };
        let params = f.controller.accept_incoming_call(&intent, &router).await.unwrap();
        assert!(params.is_incoming);
        assert_eq!(params.recipient_name, "Unknown");

        let navs = nav.navigations();
        assert_eq!(navs[0].0, Route::ActiveCall);
        assert_eq!(
            navs[0].1,
            json!({
                "channelId": "chan-in",
                "recipientName": "Unknown",
                "isIncoming": true,
                "token": "media-chan-in"
            })
        );
    }

    #[tokio::test]
    async fn accept_without_channel_is_rejected() {
        let f = fixture();
        let router = NavigationRouter::new();
        let err = f
            .controller
            .accept_incoming_call(&CallIntent::default(), &router)
            .await
            .unwrap_err();
        assert!(matches!(err, TetherError::MalformedPayload(_)));
        assert!(f.backend.joined().is_empty());
    }

    #[tokio::test]
    async fn call_history_requires_session() {
        let f = fixture();
        f.backend.set_history(vec![CallRecord {
            channel_name: "a".into(),
            caller_id: None,
            receiver_id: None,
            caller_name: None,
            receiver_name: None,
            status: Some("missed".into()),
            started_at: None,
            ended_at: None,
            duration_seconds: None,
        }]);
        assert_eq!(f.controller.call_history().await.unwrap().len(), 1);

        f.store.remove(keys::SESSION_TOKEN).await.unwrap();
        assert!(matches!(
            f.controller.call_history().await,
            Err(TetherError::Unauthenticated)
        ));
    }
}
