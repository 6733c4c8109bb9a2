// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emergency dialing across an ordered guardian list.

use std::time::Duration;

use tracing::{info, warn};

use tether_config::model::CallConfig;
use tether_core::TetherError;

use crate::controller::CallSessionController;
use crate::session::CallState;

/// Result of an SOS run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SosOutcome {
    /// A guardian picked up. The call stays live.
    Connected {
        guardian_id: String,
        channel_id: String,
    },
    /// Nobody answered.
    Exhausted { attempted: usize },
}

/// Dials guardians one at a time until one connects.
///
/// Each attempt settles when the call connects, when the connect watchdog
/// or the callee ends it, or after `call.sos_attempt_timeout_secs`.
pub struct SosDialer {
    controller: CallSessionController,
    attempt_timeout: Duration,
}

impl SosDialer {
    pub fn new(controller: CallSessionController, config: &CallConfig) -> Self {
        Self {
            controller,
            attempt_timeout: config.sos_attempt_timeout(),
        }
    }

    /// Runs the chain. Errors that need the user (no network, denied
    /// microphone, no session, busy line) stop it immediately.
    pub async fn dial(&self, guardians: &[String]) -> Result<SosOutcome, TetherError> {
        let mut attempted = 0;

        for guardian_id in guardians {
            attempted += 1;
            let started = match self.controller.start_call(guardian_id).await {
                Ok(started) => started,
                Err(e) if e.is_user_facing() => return Err(e),
                Err(e) => {
                    warn!(guardian_id = %guardian_id, error = %e, "sos attempt failed, trying next guardian");
                    continue;
                }
            };

            let mut state = self.controller.subscribe_state();
            let settled = tokio::time::timeout(self.attempt_timeout, async {
                state
                    .wait_for(|s| !matches!(s, CallState::Initializing | CallState::Joining))
                    .await
                    .map(|s| *s)
            })
            .await;

            let ours = self.controller.current_channel().as_deref() == Some(started.channel_id.as_str());
            match settled {
                Ok(Ok(CallState::Connected)) if ours => {
                    info!(guardian_id = %guardian_id, channel_id = %started.channel_id, "sos call connected");
                    return Ok(SosOutcome::Connected {
                        guardian_id: guardian_id.clone(),
                        channel_id: started.channel_id,
                    });
                }
                Ok(Ok(_)) => {
                    info!(guardian_id = %guardian_id, "sos call not answered");
                }
                Ok(Err(_)) => {
                    return Err(TetherError::Internal("call state channel closed".into()));
                }
                Err(_) => {
                    warn!(
                        guardian_id = %guardian_id,
                        timeout_secs = self.attempt_timeout.as_secs(),
                        "sos attempt timed out"
                    );
                    if ours {
                        self.controller.end_call(Some(&started.channel_id)).await;
                    }
                }
            }
        }

        warn!(attempted, "no guardian answered the sos call");
        Ok(SosOutcome::Exhausted { attempted })
    }
}
