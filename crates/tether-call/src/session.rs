// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call session state.

use strum::Display;
use tokio_util::sync::CancellationToken;

use tether_core::types::ActiveCallParams;

/// Observable call state.
///
/// `Idle -> Initializing -> Joining -> Connected -> Ended`. `Ended` is
/// reachable from every live state and behaves like `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CallState {
    Idle,
    Initializing,
    Joining,
    Connected,
    Ended,
}

impl CallState {
    pub fn is_live(self) -> bool {
        matches!(
            self,
            CallState::Initializing | CallState::Joining | CallState::Connected
        )
    }
}

/// The live session. Owned by the controller's session slot.
#[derive(Debug)]
pub(crate) struct CallSession {
    pub generation: u64,
    /// Empty until signaling assigned a channel.
    pub channel_id: String,
    pub outgoing: bool,
    /// Flips to `true` at most once.
    pub connected: bool,
    pub watchdog: Option<CancellationToken>,
}

impl CallSession {
    pub fn new(generation: u64, outgoing: bool) -> Self {
        Self {
            generation,
            channel_id: String::new(),
            outgoing,
            connected: false,
            watchdog: None,
        }
    }

    pub fn disarm_watchdog(&mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.cancel();
        }
    }
}

/// An outgoing call whose channel join has been issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedCall {
    pub channel_id: String,
    /// Media token for the channel.
    pub token: String,
    pub generation: u64,
}

impl StartedCall {
    /// Params for the active-call screen of the caller.
    pub fn active_params(&self, recipient_name: impl Into<String>) -> ActiveCallParams {
        ActiveCallParams {
            channel_id: self.channel_id.clone(),
            recipient_name: recipient_name.into(),
            is_incoming: false,
            token: Some(self.token.clone()),
        }
    }
}
