// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every platform service the core orchestrates (store, push SDK, voice SDK,
//! navigator, permission prompts, REST backend) sits behind one of these
//! traits. Async traits use `#[async_trait]` for dynamic dispatch.

pub mod backend;
pub mod device;
pub mod navigator;
pub mod presenter;
pub mod push;
pub mod store;
pub mod voice;

pub use backend::{CallSignalingApi, DeviceTokenApi};
pub use device::{AlertSink, NetworkMonitor, PermissionGate};
pub use navigator::Navigator;
pub use presenter::{BannerPresenter, NotificationHandler};
pub use push::PushProvider;
pub use store::KeyValueStore;
pub use voice::{VoiceEngine, VoiceEngineFactory};
