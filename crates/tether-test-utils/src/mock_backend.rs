// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock REST backend implementing both backend APIs.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use tether_core::types::{CallRecord, InitiatedCall, RegisterDeviceRequest};
use tether_core::{CallSignalingApi, DeviceToken, DeviceTokenApi, SessionToken, TetherError};

use crate::lock;

/// Captures every backend call and fails on demand.
///
/// `initiate_call("u1")` answers channel `chan-u1` with media token
/// `media-u1`; `join_token("c")` answers `media-c`.
#[derive(Default)]
pub struct MockBackend {
    registered: Mutex<Vec<RegisterDeviceRequest>>,
    unregistered: Mutex<Vec<String>>,
    initiated: Mutex<Vec<String>>,
    joined: Mutex<Vec<String>>,
    ended: Mutex<Vec<String>>,
    sessions: Mutex<Vec<String>>,
    history: Mutex<Vec<CallRecord>>,
    fail_register: AtomicBool,
    fail_unregister: AtomicBool,
    fail_initiate: AtomicBool,
    fail_join: AtomicBool,
    fail_end: AtomicBool,
}

fn injected(endpoint: &str) -> TetherError {
    TetherError::Backend {
        message: format!("{endpoint} returned 503 Service Unavailable"),
        status: Some(503),
        source: None,
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) -> Vec<RegisterDeviceRequest> {
        lock(&self.registered).clone()
    }

    /// Registered token values, in order.
    pub fn registered_tokens(&self) -> Vec<String> {
        lock(&self.registered).iter().map(|r| r.token.clone()).collect()
    }

    pub fn unregistered(&self) -> Vec<String> {
        lock(&self.unregistered).clone()
    }

    pub fn initiated(&self) -> Vec<String> {
        lock(&self.initiated).clone()
    }

    pub fn joined(&self) -> Vec<String> {
        lock(&self.joined).clone()
    }

    pub fn ended(&self) -> Vec<String> {
        lock(&self.ended).clone()
    }

    /// Session tokens presented, in call order.
    pub fn sessions_seen(&self) -> Vec<String> {
        lock(&self.sessions).clone()
    }

    pub fn set_history(&self, records: Vec<CallRecord>) {
        *lock(&self.history) = records;
    }

    pub fn set_register_failure(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::SeqCst);
    }

    pub fn set_unregister_failure(&self, fail: bool) {
        self.fail_unregister.store(fail, Ordering::SeqCst);
    }

    pub fn set_initiate_failure(&self, fail: bool) {
        self.fail_initiate.store(fail, Ordering::SeqCst);
    }

    pub fn set_join_failure(&self, fail: bool) {
        self.fail_join.store(fail, Ordering::SeqCst);
    }

    pub fn set_end_failure(&self, fail: bool) {
        self.fail_end.store(fail, Ordering::SeqCst);
    }

    fn saw(&self, session: &SessionToken) {
        lock(&self.sessions).push(session.expose().to_string());
    }
}

#[async_trait]
impl DeviceTokenApi for MockBackend {
    async fn register_device_token(
        &self,
        session: &SessionToken,
        request: &RegisterDeviceRequest,
    ) -> Result<(), TetherError> {
        self.saw(session);
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(injected("/device-tokens/register"));
        }
        lock(&self.registered).push(request.clone());
        Ok(())
    }

    async fn unregister_device_token(
        &self,
        session: &SessionToken,
        token: &DeviceToken,
    ) -> Result<(), TetherError> {
        self.saw(session);
        if self.fail_unregister.load(Ordering::SeqCst) {
            return Err(injected("/device-tokens/unregister"));
        }
        lock(&self.unregistered).push(token.as_str().to_string());
        Ok(())
    }
}

#[async_trait]
impl CallSignalingApi for MockBackend {
    async fn initiate_call(
        &self,
        session: &SessionToken,
        receiver_id: &str,
    ) -> Result<InitiatedCall, TetherError> {
        self.saw(session);
        if self.fail_initiate.load(Ordering::SeqCst) {
            return Err(injected("/call/initiate"));
        }
        lock(&self.initiated).push(receiver_id.to_string());
        Ok(InitiatedCall {
            channel_name: format!("chan-{receiver_id}"),
            token: format!("media-{receiver_id}"),
        })
    }

    async fn join_token(
        &self,
        session: &SessionToken,
        channel_name: &str,
    ) -> Result<String, TetherError> {
        self.saw(session);
        if self.fail_join.load(Ordering::SeqCst) {
            return Err(injected("/call/join"));
        }
        lock(&self.joined).push(channel_name.to_string());
        Ok(format!("media-{channel_name}"))
    }

    async fn end_call(
        &self,
        session: &SessionToken,
        channel_name: &str,
    ) -> Result<(), TetherError> {
        self.saw(session);
        if self.fail_end.load(Ordering::SeqCst) {
            return Err(injected("/call/end"));
        }
        lock(&self.ended).push(channel_name.to_string());
        Ok(())
    }

    async fn call_history(&self, session: &SessionToken) -> Result<Vec<CallRecord>, TetherError> {
        self.saw(session);
        Ok(lock(&self.history).clone())
    }
}
