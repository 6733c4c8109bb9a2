// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock push provider SDK.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;

use tether_core::types::PushEvent;
use tether_core::{DeviceToken, InboundPushPayload, PushProvider, TetherError};

use crate::lock;

/// A push provider with a scripted token, permission outcome and initial
/// notification. Events are injected with [`emit`](Self::emit).
pub struct MockPushProvider {
    token: Mutex<String>,
    grant_permission: AtomicBool,
    fail_get_token: AtomicBool,
    initial: Mutex<Option<InboundPushPayload>>,
    events: broadcast::Sender<PushEvent>,
    permission_requests: AtomicUsize,
    token_requests: AtomicUsize,
    token_deletions: AtomicUsize,
}

impl MockPushProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            token: Mutex::new("mock-device-token".to_string()),
            grant_permission: AtomicBool::new(true),
            fail_get_token: AtomicBool::new(false),
            initial: Mutex::new(None),
            events,
            permission_requests: AtomicUsize::new(0),
            token_requests: AtomicUsize::new(0),
            token_deletions: AtomicUsize::new(0),
        }
    }

    /// Token returned by subsequent `get_token` calls.
    pub fn set_token(&self, token: impl Into<String>) {
        *lock(&self.token) = token.into();
    }

    pub fn set_permission_granted(&self, granted: bool) {
        self.grant_permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_token_failure(&self, fail: bool) {
        self.fail_get_token.store(fail, Ordering::SeqCst);
    }

    pub fn set_initial_notification(&self, payload: Option<InboundPushPayload>) {
        *lock(&self.initial) = payload;
    }

    /// Deliver `event` to every subscriber. Returns the number of receivers.
    pub fn emit(&self, event: PushEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub fn token_deletions(&self) -> usize {
        self.token_deletions.load(Ordering::SeqCst)
    }
}

impl Default for MockPushProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn request_permission(&self) -> Result<bool, TetherError> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.grant_permission.load(Ordering::SeqCst))
    }

    async fn get_token(&self) -> Result<DeviceToken, TetherError> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_token.load(Ordering::SeqCst) {
            return Err(TetherError::push("token service unavailable"));
        }
        Ok(DeviceToken(lock(&self.token).clone()))
    }

    async fn delete_token(&self) -> Result<(), TetherError> {
        self.token_deletions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn initial_notification(&self) -> Result<Option<InboundPushPayload>, TetherError> {
        Ok(lock(&self.initial).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_token_and_failure() {
        let push = MockPushProvider::new();
        push.set_token("abc");
        assert_eq!(push.get_token().await.unwrap().as_str(), "abc");

        push.set_token_failure(true);
        assert!(push.get_token().await.is_err());
        assert_eq!(push.token_requests(), 2);
    }

    #[tokio::test]
    async fn emit_reaches_subscribers() {
        let push = MockPushProvider::new();
        assert_eq!(push.emit(PushEvent::TokenRefresh(DeviceToken("x".into()))), 0);

        let mut rx = push.subscribe();
        assert_eq!(push.emit(PushEvent::TokenRefresh(DeviceToken("y".into()))), 1);
        match rx.recv().await.unwrap() {
            PushEvent::TokenRefresh(t) => assert_eq!(t.as_str(), "y"),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
