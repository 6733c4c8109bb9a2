// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock UI navigator.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::Value;
use tether_core::{Navigator, Route, TetherError};

use crate::lock;

/// One dispatch received by [`MockNavigator`].
#[derive(Debug, Clone, PartialEq)]
pub enum NavAction {
    Navigate(Route, Value),
    GoBack,
    Reset(Route, Value),
}

/// Records dispatches in order. Failed dispatches are not recorded.
pub struct MockNavigator {
    actions: Mutex<Vec<NavAction>>,
    ready: AtomicBool,
    failures_left: AtomicUsize,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            ready: AtomicBool::new(true),
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Every recorded action.
    pub fn actions(&self) -> Vec<NavAction> {
        lock(&self.actions).clone()
    }

    /// Only forward navigations, as `(route, params)`.
    pub fn navigations(&self) -> Vec<(Route, Value)> {
        lock(&self.actions)
            .iter()
            .filter_map(|a| match a {
                NavAction::Navigate(route, params) => Some((route.clone(), params.clone())),
                _ => None,
            })
            .collect()
    }

    /// Route names of forward navigations.
    pub fn route_names(&self) -> Vec<String> {
        self.navigations()
            .into_iter()
            .map(|(route, _)| route.name().to_string())
            .collect()
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Make the next `n` dispatches fail.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    fn record(&self, action: NavAction) -> Result<(), TetherError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(TetherError::Navigation("injected navigator failure".into()));
        }
        lock(&self.actions).push(action);
        Ok(())
    }
}

impl Default for MockNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for MockNavigator {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn navigate(&self, route: &Route, params: &Value) -> Result<(), TetherError> {
        self.record(NavAction::Navigate(route.clone(), params.clone()))
    }

    fn go_back(&self) -> Result<(), TetherError> {
        self.record(NavAction::GoBack)
    }

    fn reset(&self, route: &Route, params: &Value) -> Result<(), TetherError> {
        self.record(NavAction::Reset(route.clone(), params.clone()))
    }
}
