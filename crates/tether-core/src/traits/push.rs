// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push provider SDK trait.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::TetherError;
use crate::types::{DeviceToken, InboundPushPayload, PushEvent};

/// The push-notification SDK, taken as a given capability.
#[async_trait]
pub trait PushProvider: Send + Sync + 'static {
    /// Shows the OS notification permission prompt and reports whether it was granted.
    async fn request_permission(&self) -> Result<bool, TetherError>;

    /// Fetches the current device token, minting one if needed.
    async fn get_token(&self) -> Result<DeviceToken, TetherError>;

    /// Invalidates the device token with the provider.
    async fn delete_token(&self) -> Result<(), TetherError>;

    /// The notification that launched the app from a killed state, if any.
    async fn initial_notification(&self) -> Result<Option<InboundPushPayload>, TetherError>;

    /// Subscribes to message and token-refresh events.
    fn subscribe(&self) -> broadcast::Receiver<PushEvent>;
}
