// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device capability traits: permissions, connectivity, alerts.

use async_trait::async_trait;

use crate::types::{PermissionKind, PermissionStatus, UserAlert};

/// OS runtime permission checks and prompts.
#[async_trait]
pub trait PermissionGate: Send + Sync + 'static {
    /// Current status without prompting.
    async fn check(&self, kind: PermissionKind) -> PermissionStatus;

    /// Prompts the user (or returns the settled status when a prompt is not possible).
    async fn request(&self, kind: PermissionKind) -> PermissionStatus;
}

/// Network reachability probe.
#[async_trait]
pub trait NetworkMonitor: Send + Sync + 'static {
    async fn is_reachable(&self) -> bool;
}

/// Shows blocking user-facing alerts.
pub trait AlertSink: Send + Sync + 'static {
    fn show(&self, alert: UserAlert);
}
