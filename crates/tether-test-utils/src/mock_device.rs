// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock device capabilities: permissions, connectivity and alerts.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use tether_core::types::{AlertKind, PermissionKind, PermissionStatus, UserAlert};
use tether_core::{AlertSink, NetworkMonitor, PermissionGate};

use crate::lock;

/// Permission gate whose prompt always settles to a fixed answer.
///
/// `check` reports `Undetermined` until a prompt for that permission happened.
pub struct MockPermissions {
    answer: Mutex<PermissionStatus>,
    settled: Mutex<HashMap<PermissionKind, PermissionStatus>>,
    prompts: AtomicUsize,
}

impl MockPermissions {
    /// Every prompt is granted.
    pub fn granting() -> Self {
        Self::answering(PermissionStatus::Granted)
    }

    /// Every prompt is denied.
    pub fn denying() -> Self {
        Self::answering(PermissionStatus::Denied)
    }

    fn answering(answer: PermissionStatus) -> Self {
        Self {
            answer: Mutex::new(answer),
            settled: Mutex::new(HashMap::new()),
            prompts: AtomicUsize::new(0),
        }
    }

    /// Change the answer of future prompts and forget settled ones.
    pub fn set_answer(&self, answer: PermissionStatus) {
        *lock(&self.answer) = answer;
        lock(&self.settled).clear();
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionGate for MockPermissions {
    async fn check(&self, kind: PermissionKind) -> PermissionStatus {
        lock(&self.settled)
            .get(&kind)
            .copied()
            .unwrap_or(PermissionStatus::Undetermined)
    }

    async fn request(&self, kind: PermissionKind) -> PermissionStatus {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let answer = *lock(&self.answer);
        lock(&self.settled).insert(kind, answer);
        answer
    }
}

/// Reachability toggle.
pub struct MockNetwork {
    reachable: AtomicBool,
}

impl MockNetwork {
    pub fn online() -> Self {
        Self {
            reachable: AtomicBool::new(true),
        }
    }

    pub fn offline() -> Self {
        Self {
            reachable: AtomicBool::new(false),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkMonitor for MockNetwork {
    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

/// Captures every alert shown.
#[derive(Default)]
pub struct RecordingAlerts {
    shown: Mutex<Vec<UserAlert>>,
}

impl RecordingAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<UserAlert> {
        lock(&self.shown).clone()
    }

    pub fn kinds(&self) -> Vec<AlertKind> {
        lock(&self.shown).iter().map(|a| a.kind).collect()
    }
}

impl AlertSink for RecordingAlerts {
    fn show(&self, alert: UserAlert) {
        lock(&self.shown).push(alert);
    }
}
