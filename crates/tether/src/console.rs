// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console stand-ins for the platform adapters.
//!
//! Used by the `tether` binary to run the core without a device. Every
//! call is logged; the navigator and banner also record what they were
//! asked to show so the simulator can print a summary.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use tether_core::types::{
    EngineEvent, PermissionKind, PermissionStatus, PushEvent, UserAlert,
};
use tether_core::{
    AlertSink, BannerPresenter, DeviceToken, GenericNotification, InboundPushPayload, Navigator,
    NetworkMonitor, PermissionGate, PushProvider, Route, TetherError, VoiceEngine,
    VoiceEngineFactory,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Logs and records every navigation.
#[derive(Default)]
pub struct ConsoleNavigator {
    navigations: Mutex<Vec<(Route, Value)>>,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigations(&self) -> Vec<(Route, Value)> {
        lock(&self.navigations).clone()
    }
}

impl Navigator for ConsoleNavigator {
    fn is_ready(&self) -> bool {
        true
    }

    fn navigate(&self, route: &Route, params: &Value) -> Result<(), TetherError> {
        info!(route = %route, params = %params, "navigate");
        lock(&self.navigations).push((route.clone(), params.clone()));
        Ok(())
    }

    fn go_back(&self) -> Result<(), TetherError> {
        info!("go back");
        Ok(())
    }

    fn reset(&self, route: &Route, params: &Value) -> Result<(), TetherError> {
        info!(route = %route, params = %params, "reset");
        Ok(())
    }
}

/// Logs banners instead of drawing them.
#[derive(Default)]
pub struct ConsoleBanner {
    shown: Mutex<Vec<GenericNotification>>,
}

impl ConsoleBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<GenericNotification> {
        lock(&self.shown).clone()
    }
}

impl BannerPresenter for ConsoleBanner {
    fn show(&self, notification: &GenericNotification) {
        info!(title = %notification.title, body = %notification.body, "banner");
        lock(&self.shown).push(notification.clone());
    }

    fn hide(&self) {
        debug!("banner hidden");
    }
}

/// A push provider with a fixed token and an optional launch notification.
pub struct ConsolePush {
    token: String,
    initial: Mutex<Option<InboundPushPayload>>,
    events: broadcast::Sender<PushEvent>,
}

impl ConsolePush {
    pub fn new(token: impl Into<String>, initial: Option<InboundPushPayload>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            token: token.into(),
            initial: Mutex::new(initial),
            events,
        }
    }

    /// Delivers `event` to subscribers. Returns how many received it.
    pub fn emit(&self, event: PushEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }
}

#[async_trait]
impl PushProvider for ConsolePush {
    async fn request_permission(&self) -> Result<bool, TetherError> {
        info!("notification permission granted");
        Ok(true)
    }

    async fn get_token(&self) -> Result<DeviceToken, TetherError> {
        Ok(DeviceToken(self.token.clone()))
    }

    async fn delete_token(&self) -> Result<(), TetherError> {
        info!("device token invalidated");
        Ok(())
    }

    async fn initial_notification(&self) -> Result<Option<InboundPushPayload>, TetherError> {
        // The launch notification is reported once.
        Ok(lock(&self.initial).take())
    }

    fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }
}

/// Voice engine that only logs.
pub struct ConsoleVoice {
    events: broadcast::Sender<EngineEvent>,
}

#[async_trait]
impl VoiceEngine for ConsoleVoice {
    async fn initialize(&self, app_id: &str) -> Result<(), TetherError> {
        info!(app_id, "voice engine initialize");
        Ok(())
    }

    async fn enable_audio(&self) -> Result<(), TetherError> {
        debug!("voice engine audio enabled");
        Ok(())
    }

    async fn join_channel(&self, _token: &str, channel: &str, uid: u32) -> Result<(), TetherError> {
        info!(channel_id = channel, uid, "voice engine join");
        Ok(())
    }

    async fn leave_channel(&self) -> Result<(), TetherError> {
        info!("voice engine leave");
        Ok(())
    }

    async fn release(&self) -> Result<(), TetherError> {
        debug!("voice engine released");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
pub struct ConsoleVoiceFactory;

#[async_trait]
impl VoiceEngineFactory for ConsoleVoiceFactory {
    async fn create(&self) -> Result<Arc<dyn VoiceEngine>, TetherError> {
        let (events, _) = broadcast::channel(16);
        Ok(Arc::new(ConsoleVoice { events }))
    }
}

/// Grants everything and reports the network as up.
#[derive(Default)]
pub struct ConsoleDevice;

#[async_trait]
impl PermissionGate for ConsoleDevice {
    async fn check(&self, _kind: PermissionKind) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request(&self, _kind: PermissionKind) -> PermissionStatus {
        PermissionStatus::Granted
    }
}

#[async_trait]
impl NetworkMonitor for ConsoleDevice {
    async fn is_reachable(&self) -> bool {
        true
    }
}

impl AlertSink for ConsoleDevice {
    fn show(&self, alert: UserAlert) {
        warn!(kind = %alert.kind, title = %alert.title, message = %alert.message, "alert");
    }
}
