// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST backend client for the Tether client core.
//!
//! [`BackendClient`] implements [`tether_core::DeviceTokenApi`] and
//! [`tether_core::CallSignalingApi`] over `reqwest`.

pub mod client;
mod envelope;

pub use client::BackendClient;
