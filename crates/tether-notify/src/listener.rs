// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push provider event subscription.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tether_core::PushProvider;
use tether_core::types::PushEvent;
use tether_push::PushRegistrationManager;

use crate::dispatcher::NotificationDispatcher;

/// Feeds provider events into the dispatcher and the registration manager.
///
/// Events are processed one at a time in delivery order.
pub struct PushEventListener;

impl PushEventListener {
    /// Subscribes and spawns the listener task. Dropping the returned
    /// handle unsubscribes.
    pub fn spawn(
        provider: &dyn PushProvider,
        dispatcher: Arc<NotificationDispatcher>,
        registration: Arc<PushRegistrationManager>,
    ) -> ListenerHandle {
        let mut events = provider.subscribe();
        let cancel = CancellationToken::new();
        let stop = cancel.clone();

        let task = tokio::spawn(async move {
            info!("push event listener started");
            loop {
                let event = tokio::select! {
                    _ = stop.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(PushEvent::Foreground(payload)) => dispatcher.on_foreground(payload).await,
                    Ok(PushEvent::Opened(payload)) => dispatcher.on_opened(payload).await,
                    Ok(PushEvent::Background(payload)) => dispatcher.on_background(&payload).await,
                    Ok(PushEvent::TokenRefresh(token)) => {
                        registration.on_token_refresh(&token).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "push event listener lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("push event listener stopped");
        });

        ListenerHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Subscription handle. The listener stops when this is dropped.
pub struct ListenerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Stops the listener and waits for it to finish the event in flight.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
