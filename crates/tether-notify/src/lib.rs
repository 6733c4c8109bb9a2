// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push notification pipeline for the Tether client core.
//!
//! Inbound push payloads have no fixed shape. The [`classifier`] decides
//! whether a payload signals an incoming call and normalizes its
//! parameters. The [`dispatcher`] applies the delivery-state rules
//! (foreground, opened from background, cold start, true background) and
//! routes calls to the incoming-call screen and everything else to a
//! [`NotificationHandler`](tether_core::NotificationHandler), usually the
//! [`banner`] controller. The [`listener`] feeds provider events into both.

pub mod banner;
pub mod classifier;
pub mod dispatcher;
pub mod listener;

pub use banner::BannerController;
pub use classifier::{Classification, classify, extract_call_intent, is_call_notification};
pub use dispatcher::{HandledAs, NotificationDispatcher};
pub use listener::{ListenerHandle, PushEventListener};
