// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice engine event subscription.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tether_core::VoiceEngine;

use crate::controller::WeakController;

/// Owns the engine event task. Dropping it unsubscribes.
#[derive(Debug)]
pub struct EngineListenerHandle {
    task: JoinHandle<()>,
}

impl EngineListenerHandle {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for EngineListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Forwards engine events to the controller until the engine closes its
/// stream or the controller is gone.
pub(crate) fn spawn(engine: &dyn VoiceEngine, controller: WeakController) -> EngineListenerHandle {
    let mut events = engine.subscribe();
    let task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Some(controller) = controller.upgrade() else {
                        break;
                    };
                    controller.handle_engine_event(event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "voice engine listener lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("voice engine listener stopped");
    });
    EngineListenerHandle { task }
}
