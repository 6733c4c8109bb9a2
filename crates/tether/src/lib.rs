// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tether - the client core of a parental supervision app.
//!
//! Wires the notification pipeline, navigation router, push registration
//! and call sessions into one [`AppContext`]. Platform integrations are
//! supplied as [`Adapters`]; [`console`] provides logging stand-ins.

pub mod app;
pub mod console;

pub use app::{Adapters, AppContext};
