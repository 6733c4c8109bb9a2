// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Navigation router for the Tether client core.
//!
//! The UI screen stack mounts some time after the process starts, while
//! push handling may want to navigate immediately. [`NavigationRouter`]
//! accepts forward navigations at any time and queues them until the stack
//! is ready, then drains the queue once in enqueue order.

pub mod router;

pub use router::{NavigationOutcome, NavigationRouter, PendingNavigation};
