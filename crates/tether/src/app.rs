// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service wiring.
//!
//! [`AppContext`] builds every long-lived service exactly once from the
//! configuration and the platform adapters, and shares them by `Arc`. The
//! host drives it through the app lifecycle: [`launch`](AppContext::launch),
//! [`navigation_ready`](AppContext::navigation_ready),
//! [`login`](AppContext::login) / [`logout`](AppContext::logout) and
//! [`shutdown`](AppContext::shutdown).

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use tether_call::{CallDeps, CallSessionController, SosDialer};
use tether_config::TetherConfig;
use tether_core::types::keys;
use tether_core::{
    AlertSink, BannerPresenter, CallSignalingApi, DeviceToken, DeviceTokenApi, KeyValueStore,
    Navigator, NetworkMonitor, PermissionGate, PushProvider, SessionToken, TetherError,
    VoiceEngineFactory,
};
use tether_notify::{
    BannerController, HandledAs, ListenerHandle, NotificationDispatcher, PushEventListener,
};
use tether_push::{PushRegistrationManager, RegistrationOutcome};
use tether_router::NavigationRouter;

/// Platform-provided collaborators.
#[derive(Clone)]
pub struct Adapters {
    pub store: Arc<dyn KeyValueStore>,
    pub push: Arc<dyn PushProvider>,
    pub navigator: Arc<dyn Navigator>,
    pub banner: Arc<dyn BannerPresenter>,
    pub voice: Arc<dyn VoiceEngineFactory>,
    pub permissions: Arc<dyn PermissionGate>,
    pub network: Arc<dyn NetworkMonitor>,
    pub alerts: Arc<dyn AlertSink>,
    pub device_tokens: Arc<dyn DeviceTokenApi>,
    pub signaling: Arc<dyn CallSignalingApi>,
}

/// The wired client core.
pub struct AppContext {
    pub config: TetherConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub push: Arc<dyn PushProvider>,
    pub router: Arc<NavigationRouter>,
    pub registration: Arc<PushRegistrationManager>,
    pub banner: Arc<BannerController>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub calls: CallSessionController,
    listener: Mutex<Option<ListenerHandle>>,
}

impl AppContext {
    pub fn new(config: TetherConfig, adapters: Adapters) -> Self {
        let router = Arc::new(NavigationRouter::new());
        router.attach(adapters.navigator);

        let banner = Arc::new(BannerController::new(
            adapters.banner,
            Arc::clone(&router),
            config.notifications.banner_dismiss(),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            &config.notifications,
            Arc::clone(&router),
            banner.clone(),
        ));
        let registration = Arc::new(PushRegistrationManager::from_config(
            &config.app,
            Arc::clone(&adapters.store),
            Arc::clone(&adapters.push),
            adapters.device_tokens,
        ));
        let calls = CallSessionController::new(
            config.call.clone(),
            CallDeps {
                store: Arc::clone(&adapters.store),
                api: adapters.signaling,
                engine_factory: adapters.voice,
                permissions: adapters.permissions,
                network: adapters.network,
                alerts: adapters.alerts,
            },
        );

        debug!(app = %config.app.name, platform = %config.app.platform, "services wired");
        Self {
            config,
            store: adapters.store,
            push: adapters.push,
            router,
            registration,
            banner,
            dispatcher,
            calls,
            listener: Mutex::new(None),
        }
    }

    /// App start: holds the launch notification, subscribes to push events
    /// and brings up the voice engine when calling is configured.
    ///
    /// Returns `true` when the app was launched from a notification.
    pub async fn launch(&self) -> bool {
        let cold_start = self
            .dispatcher
            .capture_initial_notification(self.push.as_ref())
            .await;

        let handle = PushEventListener::spawn(
            self.push.as_ref(),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.registration),
        );
        if let Some(previous) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle)
        {
            debug!("replaced existing push event listener");
            drop(previous);
        }

        if self.config.call.app_id.is_some() && !self.calls.init().await {
            warn!("voice engine unavailable, calls will retry initialization");
        }

        info!(cold_start, "client core launched");
        cold_start
    }

    /// Asks for notification permission and syncs the device token. Without
    /// a session the token is parked until [`login`](Self::login).
    pub async fn register_push(&self) -> Option<DeviceToken> {
        if !self.registration.request_permission().await {
            info!("notification permission not granted, skipping token registration");
            return None;
        }
        self.registration.get_token().await
    }

    /// The screen stack is mounted. Flushes queued navigations and handles
    /// the launch notification, if any.
    pub async fn navigation_ready(&self) -> Option<HandledAs> {
        self.router.mark_ready();
        if self.dispatcher.has_pending_cold_start() {
            self.dispatcher.process_cold_start().await
        } else {
            None
        }
    }

    /// Stores the session and registers the device token captured before login.
    pub async fn login(&self, session: &SessionToken) -> Result<RegistrationOutcome, TetherError> {
        self.store.set(keys::SESSION_TOKEN, session.expose()).await?;
        info!("session stored");
        Ok(self
            .registration
            .consume_pending_token_after_login(session)
            .await)
    }

    /// Ends any live call, unregisters the device and forgets the session.
    pub async fn logout(&self) -> Result<(), TetherError> {
        let channel = self.calls.current_channel();
        self.calls.end_call(channel.as_deref()).await;
        self.registration.delete_token().await;
        self.store.remove(keys::SESSION_TOKEN).await?;
        info!("logged out");
        Ok(())
    }

    pub fn sos_dialer(&self) -> SosDialer {
        SosDialer::new(self.calls.clone(), &self.config.call)
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(ListenerHandle::is_active)
    }

    /// Stops the push listener and releases the voice engine.
    pub async fn shutdown(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.unsubscribe().await;
        }
        self.banner.dismiss();
        self.calls.destroy_engine().await;
        info!("client core shut down");
    }
}
