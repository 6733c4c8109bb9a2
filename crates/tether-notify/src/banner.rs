// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-app banner lifecycle: show, auto-dismiss, tap-to-navigate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tether_core::{BannerPresenter, GenericNotification, NotificationHandler, Route, TetherError};
use tether_router::{NavigationOutcome, NavigationRouter};

struct ActiveBanner {
    id: u64,
    notification: GenericNotification,
    dismiss_timer: CancellationToken,
}

type Slot = Arc<Mutex<Option<ActiveBanner>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<ActiveBanner>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shows one banner at a time through a [`BannerPresenter`].
///
/// A newer banner replaces the current one and cancels its timer. Must be
/// used from within a Tokio runtime.
pub struct BannerController {
    presenter: Arc<dyn BannerPresenter>,
    router: Arc<NavigationRouter>,
    dismiss_after: Duration,
    current: Slot,
    next_id: AtomicU64,
}

impl BannerController {
    pub fn new(
        presenter: Arc<dyn BannerPresenter>,
        router: Arc<NavigationRouter>,
        dismiss_after: Duration,
    ) -> Self {
        Self {
            presenter,
            router,
            dismiss_after,
            current: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn show(&self, notification: GenericNotification) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let timer = CancellationToken::new();

        let replaced = lock(&self.current).replace(ActiveBanner {
            id,
            notification: notification.clone(),
            dismiss_timer: timer.clone(),
        });
        if let Some(old) = replaced {
            old.dismiss_timer.cancel();
        }
        self.presenter.show(&notification);
        debug!(id, title = %notification.title, "banner shown");

        let slot = Arc::clone(&self.current);
        let presenter = Arc::clone(&self.presenter);
        let dismiss_after = self.dismiss_after;
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(dismiss_after) => {
                    let expired = {
                        let mut current = lock(&slot);
                        if current.as_ref().is_some_and(|b| b.id == id) {
                            current.take();
                            true
                        } else {
                            false
                        }
                    };
                    if expired {
                        presenter.hide();
                        debug!(id, "banner auto-dismissed");
                    }
                }
            }
        });
    }

    /// Closes the current banner. `false` when none is showing.
    pub fn dismiss(&self) -> bool {
        match self.take_current() {
            Some(_) => {
                self.presenter.hide();
                true
            }
            None => false,
        }
    }

    /// Closes the current banner and opens its `data.screen`, if any.
    pub fn tap(&self) -> Option<NavigationOutcome> {
        let banner = self.take_current()?;
        self.presenter.hide();
        let screen = banner.notification.screen()?;
        debug!(screen, "banner tapped");
        Some(
            self.router
                .navigate(Route::Screen(screen.to_string()), banner.notification.params()),
        )
    }

    /// The notification currently on screen.
    pub fn current(&self) -> Option<GenericNotification> {
        lock(&self.current).as_ref().map(|b| b.notification.clone())
    }

    fn take_current(&self) -> Option<ActiveBanner> {
        let banner = lock(&self.current).take()?;
        banner.dismiss_timer.cancel();
        Some(banner)
    }
}

#[async_trait]
impl NotificationHandler for BannerController {
    async fn on_generic_notification(
        &self,
        notification: GenericNotification,
    ) -> Result<(), TetherError> {
        self.show(notification);
        Ok(())
    }
}
