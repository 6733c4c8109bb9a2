// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tether tests.
//!
//! Provides mock collaborators for fast, deterministic tests without a
//! device, a push SDK, a voice SDK or a backend.
//!
//! # Components
//!
//! - [`MockPushProvider`] - token minting, permission outcome and event injection
//! - [`MockNavigator`] - records every dispatch, can fail on demand
//! - [`MockVoiceEngine`] / [`MockVoiceEngineFactory`] - records engine calls, emits events
//! - [`MockBackend`] - both backend APIs with call capture and failure toggles
//! - [`MockPermissions`], [`MockNetwork`], [`RecordingAlerts`] - device capabilities
//! - [`RecordingBanner`], [`RecordingHandler`] - notification sinks

pub mod mock_backend;
pub mod mock_device;
pub mod mock_navigator;
pub mod mock_presenter;
pub mod mock_push;
pub mod mock_voice;

pub use mock_backend::MockBackend;
pub use mock_device::{MockNetwork, MockPermissions, RecordingAlerts};
pub use mock_navigator::{MockNavigator, NavAction};
pub use mock_presenter::{RecordingBanner, RecordingHandler};
pub use mock_push::MockPushProvider;
pub use mock_voice::{EngineCall, MockVoiceEngine, MockVoiceEngineFactory};
pub use tether_storage::MemoryStore;

use std::sync::{Mutex, MutexGuard};

/// Lock a mock's state, ignoring poisoning from a panicked test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
