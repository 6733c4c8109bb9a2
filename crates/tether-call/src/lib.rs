// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice call sessions for the Tether client core.
//!
//! [`CallSessionController`] owns the process-wide voice engine and at most
//! one live call session. Sessions are tagged with a generation number so
//! that late engine events and stale watchdogs never touch a replacement
//! session.

pub mod controller;
pub mod events;
pub mod session;
pub mod sos;

pub use controller::{CallDeps, CallSessionController};
pub use events::EngineListenerHandle;
pub use session::{CallState, StartedCall};
pub use sos::{SosDialer, SosOutcome};
