// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tether simulate` command implementation.
//!
//! Feeds one push payload through the full pipeline with console adapters
//! and prints every navigation and banner it produced.

use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::info;

use tether::console::{ConsoleBanner, ConsoleDevice, ConsoleNavigator, ConsolePush, ConsoleVoiceFactory};
use tether::{Adapters, AppContext};
use tether_api::BackendClient;
use tether_config::TetherConfig;
use tether_core::{InboundPushPayload, KeyValueStore, TetherError};
use tether_notify::{Classification, classify};
use tether_storage::{MemoryStore, SqliteStore};

/// App state the payload is delivered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeliveryState {
    /// App in the foreground.
    Foreground,
    /// User tapped the notification while the app was backgrounded.
    Opened,
    /// Notification launched the app from a killed state.
    ColdStart,
    /// Headless delivery while backgrounded.
    Background,
}

/// Runs the `tether simulate` command.
pub async fn run_simulate(
    config: TetherConfig,
    payload_path: &Path,
    state: DeliveryState,
    persistent: bool,
) -> Result<(), TetherError> {
    let raw = tokio::fs::read_to_string(payload_path).await.map_err(|e| {
        TetherError::Internal(format!("cannot read {}: {e}", payload_path.display()))
    })?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| TetherError::MalformedPayload(format!("{}: {e}", payload_path.display())))?;
    let payload = InboundPushPayload::from_value(value);

    println!("classified as {}", describe(&classify(&payload)));

    let store: Arc<dyn KeyValueStore> = if persistent {
        Arc::new(SqliteStore::from_config(&config.storage).await?)
    } else {
        Arc::new(MemoryStore::new())
    };
    let backend = Arc::new(BackendClient::new(&config.backend)?);
    let navigator = Arc::new(ConsoleNavigator::new());
    let banner = Arc::new(ConsoleBanner::new());
    let initial = (state == DeliveryState::ColdStart).then(|| payload.clone());
    let push = Arc::new(ConsolePush::new("console-device-token", initial));
    let device = Arc::new(ConsoleDevice);

    let ctx = AppContext::new(
        config,
        Adapters {
            store,
            push,
            navigator: navigator.clone(),
            banner: banner.clone(),
            voice: Arc::new(ConsoleVoiceFactory),
            permissions: device.clone(),
            network: device.clone(),
            alerts: device,
            device_tokens: backend.clone(),
            signaling: backend,
        },
    );

    ctx.launch().await;
    info!(state = ?state, "delivering payload");
    match state {
        DeliveryState::ColdStart => {
            ctx.navigation_ready().await;
        }
        DeliveryState::Foreground => {
            ctx.navigation_ready().await;
            ctx.dispatcher.on_foreground(payload).await;
        }
        DeliveryState::Opened => {
            ctx.navigation_ready().await;
            ctx.dispatcher.on_opened(payload).await;
        }
        DeliveryState::Background => {
            ctx.dispatcher.on_background(&payload).await;
        }
    }

    let navigations = navigator.navigations();
    let banners = banner.shown();
    for (route, params) in &navigations {
        println!("navigate {route} {params}");
    }
    for shown in &banners {
        println!("banner {:?}: {:?}", shown.title, shown.body);
    }
    if navigations.is_empty() && banners.is_empty() {
        println!("nothing shown");
    }

    ctx.shutdown().await;
    Ok(())
}

fn describe(classification: &Classification) -> String {
    match classification {
        Classification::Call(intent) => format!(
            "call from {} on channel {:?}",
            intent.display_name(),
            intent.channel_id
        ),
        Classification::Generic(notification) => {
            format!("generic notification {:?}", notification.title)
        }
        Classification::Unrecognized => "unrecognized".to_string(),
    }
}
