// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST backend traits for the endpoints the core consumes.

use async_trait::async_trait;

use crate::error::TetherError;
use crate::types::{CallRecord, DeviceToken, InitiatedCall, RegisterDeviceRequest, SessionToken};

/// Device token registration endpoints.
#[async_trait]
pub trait DeviceTokenApi: Send + Sync + 'static {
    async fn register_device_token(
        &self,
        session: &SessionToken,
        request: &RegisterDeviceRequest,
    ) -> Result<(), TetherError>;

    async fn unregister_device_token(
        &self,
        session: &SessionToken,
        token: &DeviceToken,
    ) -> Result<(), TetherError>;
}

/// Call signaling endpoints.
#[async_trait]
pub trait CallSignalingApi: Send + Sync + 'static {
    /// Creates a channel for a call to `receiver_id`.
    async fn initiate_call(
        &self,
        session: &SessionToken,
        receiver_id: &str,
    ) -> Result<InitiatedCall, TetherError>;

    /// Issues a media token for joining `channel_name`.
    async fn join_token(
        &self,
        session: &SessionToken,
        channel_name: &str,
    ) -> Result<String, TetherError>;

    /// Marks the call on `channel_name` as finished.
    async fn end_call(&self, session: &SessionToken, channel_name: &str)
    -> Result<(), TetherError>;

    async fn call_history(&self, session: &SessionToken) -> Result<Vec<CallRecord>, TetherError>;
}
