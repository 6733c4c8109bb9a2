// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time voice engine SDK traits.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::TetherError;
use crate::types::EngineEvent;

/// A constructed voice engine instance.
#[async_trait]
pub trait VoiceEngine: Send + Sync + 'static {
    /// Initializes the engine with the application's service identity.
    async fn initialize(&self, app_id: &str) -> Result<(), TetherError>;

    /// Enables the audio module.
    async fn enable_audio(&self) -> Result<(), TetherError>;

    /// Joins `channel` with a signaling-issued `token`.
    async fn join_channel(&self, token: &str, channel: &str, uid: u32) -> Result<(), TetherError>;

    /// Leaves the current channel, if any.
    async fn leave_channel(&self) -> Result<(), TetherError>;

    /// Releases all native resources. The instance is unusable afterward.
    async fn release(&self) -> Result<(), TetherError>;

    /// Subscribes to engine events.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}

/// Constructs voice engine instances.
#[async_trait]
pub trait VoiceEngineFactory: Send + Sync + 'static {
    async fn create(&self) -> Result<Arc<dyn VoiceEngine>, TetherError>;
}
