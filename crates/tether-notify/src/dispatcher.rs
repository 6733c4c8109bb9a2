// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-state dispatch of inbound push payloads.
//!
//! | state                 | behavior                                              |
//! |-----------------------|-------------------------------------------------------|
//! | foreground            | classify on receipt                                   |
//! | opened from background| classify after `opened_delay_ms`                      |
//! | cold start            | hold until the router is ready, then bounded retries  |
//! | true background       | acknowledge only                                      |

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use tether_config::model::NotificationConfig;
use tether_core::types::IncomingCallParams;
use tether_core::{
    CallIntent, InboundPushPayload, NotificationHandler, PushProvider, Route, TetherError,
};
use tether_router::NavigationRouter;

use crate::classifier::{Classification, classify};

/// How a payload was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum HandledAs {
    /// Navigation to the incoming-call screen was issued.
    Call(CallIntent),
    /// Delivered to the generic notification handler.
    Generic,
    /// Nothing to do.
    Unrecognized,
}

/// Routes classified payloads to call navigation or the generic handler.
pub struct NotificationDispatcher {
    router: Arc<NavigationRouter>,
    handler: Arc<dyn NotificationHandler>,
    call_navigation_delay: Duration,
    opened_delay: Duration,
    cold_start_attempts: u32,
    cold_start_backoff: Duration,
    pending_cold_start: Mutex<Option<InboundPushPayload>>,
}

impl NotificationDispatcher {
    pub fn new(
        config: &NotificationConfig,
        router: Arc<NavigationRouter>,
        handler: Arc<dyn NotificationHandler>,
    ) -> Self {
        Self {
            router,
            handler,
            call_navigation_delay: config.call_navigation_delay(),
            opened_delay: config.opened_delay(),
            cold_start_attempts: config.cold_start_attempts.max(1),
            cold_start_backoff: config.cold_start_backoff(),
            pending_cold_start: Mutex::new(None),
        }
    }

    /// Classifies `payload` and acts on it.
    ///
    /// Only the generic handler can fail; call navigation is queued by the
    /// router when the UI is not up yet.
    pub async fn handle(&self, payload: &InboundPushPayload) -> Result<HandledAs, TetherError> {
        match classify(payload) {
            Classification::Call(intent) => {
                self.navigate_to_incoming_call(&intent).await;
                Ok(HandledAs::Call(intent))
            }
            Classification::Generic(notification) => {
                debug!(title = %notification.title, "delivering generic notification");
                self.handler.on_generic_notification(notification).await?;
                Ok(HandledAs::Generic)
            }
            Classification::Unrecognized => {
                debug!("empty push payload ignored");
                Ok(HandledAs::Unrecognized)
            }
        }
    }

    /// Runs the call path only. `false` when the payload is not an
    /// actionable call, in which case the caller falls back to generic
    /// handling.
    pub async fn handle_call_notification(&self, payload: &InboundPushPayload) -> bool {
        match classify(payload) {
            Classification::Call(intent) => {
                self.navigate_to_incoming_call(&intent).await;
                true
            }
            _ => false,
        }
    }

    async fn navigate_to_incoming_call(&self, intent: &CallIntent) {
        info!(
            channel_id = %intent.channel_id,
            caller = %intent.display_name(),
            "incoming call notification"
        );
        tokio::time::sleep(self.call_navigation_delay).await;
        let params = match serde_json::to_value(IncomingCallParams::from(intent)) {
            Ok(params) => params,
            Err(e) => {
                error!(error = %e, "could not encode incoming call params");
                return;
            }
        };
        self.router.navigate(Route::IncomingCall, params);
    }

    pub async fn on_foreground(&self, payload: InboundPushPayload) {
        if let Err(e) = self.handle(&payload).await {
            warn!(error = %e, "foreground notification handling failed");
        }
    }

    /// The user tapped a notification while the app was backgrounded.
    pub async fn on_opened(&self, payload: InboundPushPayload) {
        tokio::time::sleep(self.opened_delay).await;
        if let Err(e) = self.handle(&payload).await {
            warn!(error = %e, "opened notification handling failed");
        }
    }

    /// Headless delivery. The OS shows the notification itself.
    pub async fn on_background(&self, payload: &InboundPushPayload) {
        debug!(
            has_notification = payload.title().is_some(),
            data_keys = payload.data.len(),
            "background message acknowledged"
        );
    }

    /// Polls the provider once for the notification that launched the app
    /// and holds it for [`process_cold_start`](Self::process_cold_start).
    pub async fn capture_initial_notification(&self, provider: &dyn PushProvider) -> bool {
        match provider.initial_notification().await {
            Ok(Some(payload)) => {
                info!("app launched from a notification");
                self.set_pending(Some(payload));
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "initial notification lookup failed");
                false
            }
        }
    }

    pub fn has_pending_cold_start(&self) -> bool {
        self.pending_cold_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Waits for the router, then handles the held notification with up to
    /// `cold_start_attempts` tries. After the last failure the notification
    /// is dropped.
    pub async fn process_cold_start(&self) -> Option<HandledAs> {
        let payload = self.take_pending()?;
        self.router.wait_ready().await;

        let mut attempt = 1;
        loop {
            match self.handle(&payload).await {
                Ok(handled) => {
                    debug!(attempt, "cold start notification handled");
                    return Some(handled);
                }
                Err(e) if attempt < self.cold_start_attempts => {
                    warn!(attempt, error = %e, "cold start notification handling failed, retrying");
                    tokio::time::sleep(self.cold_start_backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts = attempt, error = %e, "dropping cold start notification");
                    return None;
                }
            }
        }
    }

    fn set_pending(&self, payload: Option<InboundPushPayload>) {
        *self
            .pending_cold_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = payload;
    }

    fn take_pending(&self) -> Option<InboundPushPayload> {
        self.pending_cold_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
