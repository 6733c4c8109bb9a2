// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification presentation traits.

use async_trait::async_trait;

use crate::error::TetherError;
use crate::types::GenericNotification;

/// Renders the transient in-app banner.
pub trait BannerPresenter: Send + Sync + 'static {
    fn show(&self, notification: &GenericNotification);

    fn hide(&self);
}

/// Receives notifications the classifier did not treat as calls.
#[async_trait]
pub trait NotificationHandler: Send + Sync + 'static {
    async fn on_generic_notification(
        &self,
        notification: GenericNotification,
    ) -> Result<(), TetherError>;
}
