// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push token registration for the Tether client core.
//!
//! The device push token is persisted under `fcmToken` and registered with
//! the backend whenever a session exists. Without a session the token is
//! parked under `pendingFcmToken` and registered right after login.

pub mod manager;

pub use manager::{PushRegistrationManager, RegistrationOutcome};
