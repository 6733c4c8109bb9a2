// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router state machine: `NotReady -> Ready`, one-way.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tether_core::{Navigator, Route};

/// A forward navigation issued before the router was ready.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNavigation {
    pub route: Route,
    pub params: Value,
}

/// What [`NavigationRouter::navigate`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Handed to the navigator.
    Dispatched,
    /// Held until the router is ready.
    Queued,
}

#[derive(Default)]
struct RouterState {
    navigator: Option<Arc<dyn Navigator>>,
    ready: bool,
    /// Set while a drain is dispatching outside the lock. New requests
    /// queue behind the drain to keep FIFO order.
    draining: bool,
    queue: VecDeque<PendingNavigation>,
}

impl RouterState {
    fn can_dispatch(&self) -> Option<Arc<dyn Navigator>> {
        if self.ready && !self.draining {
            self.navigator.clone()
        } else {
            None
        }
    }
}

/// Owns the navigator handle, the ready flag and the pending queue.
///
/// Every operation is safe in either state. Dispatch failures are logged,
/// never returned.
pub struct NavigationRouter {
    state: Mutex<RouterState>,
    ready_tx: watch::Sender<bool>,
}

impl NavigationRouter {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            state: Mutex::new(RouterState::default()),
            ready_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs the UI navigator. If the router is already ready, anything
    /// queued is flushed now.
    pub fn attach(&self, navigator: Arc<dyn Navigator>) {
        let flush = {
            let mut state = self.lock();
            state.navigator = Some(navigator);
            let flush = state.ready && !state.draining && !state.queue.is_empty();
            state.draining |= flush;
            flush
        };
        debug!("navigator attached");
        if flush {
            self.drain();
        }
    }

    /// Marks the screen stack ready and drains the queue. Idempotent.
    pub fn mark_ready(&self) {
        let flush = {
            let mut state = self.lock();
            if state.ready {
                return;
            }
            state.ready = true;
            let flush = state.navigator.is_some() && !state.draining;
            state.draining |= flush;
            flush
        };
        self.ready_tx.send_replace(true);
        info!("navigation router ready");
        if flush {
            self.drain();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }

    /// Resolves once [`mark_ready`](Self::mark_ready) has been called.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Dispatches now when ready, queues otherwise. Queuing is not a failure.
    pub fn navigate(&self, route: Route, params: Value) -> NavigationOutcome {
        let navigator = {
            let mut state = self.lock();
            match state.can_dispatch() {
                Some(navigator) => navigator,
                None => {
                    debug!(route = %route, queued = state.queue.len() + 1, "navigation queued until router is ready");
                    state.queue.push_back(PendingNavigation { route, params });
                    return NavigationOutcome::Queued;
                }
            }
        };
        dispatch(navigator.as_ref(), &route, &params);
        NavigationOutcome::Dispatched
    }

    /// Pops the current screen. No-op before readiness; never queued.
    pub fn go_back(&self) -> bool {
        let Some(navigator) = self.lock().can_dispatch() else {
            debug!("go_back ignored, router not ready");
            return false;
        };
        if let Err(e) = navigator.go_back() {
            warn!(error = %e, "go_back dispatch failed");
        }
        true
    }

    /// Replaces the stack with `route`. No-op before readiness; never queued.
    pub fn reset(&self, route: Route, params: Value) -> bool {
        let Some(navigator) = self.lock().can_dispatch() else {
            debug!(route = %route, "reset ignored, router not ready");
            return false;
        };
        if let Err(e) = navigator.reset(&route, &params) {
            warn!(route = %route, error = %e, "reset dispatch failed");
        }
        true
    }

    /// Number of queued navigations.
    pub fn pending_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Dispatches batches until the queue stays empty.
    fn drain(&self) {
        let mut total = 0usize;
        loop {
            let (navigator, batch) = {
                let mut state = self.lock();
                let navigator = match state.navigator.clone() {
                    Some(n) if !state.queue.is_empty() => n,
                    _ => {
                        state.draining = false;
                        break;
                    }
                };
                (navigator, std::mem::take(&mut state.queue))
            };
            for pending in batch {
                dispatch(navigator.as_ref(), &pending.route, &pending.params);
                total += 1;
            }
        }
        if total > 0 {
            info!(count = total, "pending navigations flushed");
        }
    }
}

impl Default for NavigationRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch(navigator: &dyn Navigator, route: &Route, params: &Value) {
    match navigator.navigate(route, params) {
        Ok(()) => debug!(route = %route, "navigated"),
        Err(e) => warn!(route = %route, error = %e, "navigation dispatch failed"),
    }
}
