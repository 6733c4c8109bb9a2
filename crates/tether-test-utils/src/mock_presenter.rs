// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording notification sinks.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use tether_core::{BannerPresenter, GenericNotification, NotificationHandler, TetherError};

use crate::lock;

/// Banner renderer that records what it was asked to show.
#[derive(Default)]
pub struct RecordingBanner {
    shown: Mutex<Vec<GenericNotification>>,
    hides: AtomicUsize,
}

impl RecordingBanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<GenericNotification> {
        lock(&self.shown).clone()
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }
}

impl BannerPresenter for RecordingBanner {
    fn show(&self, notification: &GenericNotification) {
        lock(&self.shown).push(notification.clone());
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}

/// Generic-notification sink that can fail a scripted number of times.
#[derive(Default)]
pub struct RecordingHandler {
    received: Mutex<Vec<GenericNotification>>,
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` deliveries fail.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Successful deliveries.
    pub fn received(&self) -> Vec<GenericNotification> {
        lock(&self.received).clone()
    }

    /// Every delivery attempt, failed or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationHandler for RecordingHandler {
    async fn on_generic_notification(
        &self,
        notification: GenericNotification,
    ) -> Result<(), TetherError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(TetherError::Internal("injected handler failure".into()));
        }
        lock(&self.received).push(notification);
        Ok(())
    }
}
