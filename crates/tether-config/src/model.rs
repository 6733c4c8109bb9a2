// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tether client core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_core::types::{DeviceInfo, Platform};

/// Top-level Tether configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Application identity and device metadata.
    #[serde(default)]
    pub app: AppConfig,

    /// REST backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Key-value store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Push notification delivery timings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Voice call settings.
    #[serde(default)]
    pub call: CallConfig,
}

/// Application identity and device metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name of the application.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// OS family the client runs on.
    #[serde(default = "default_platform")]
    pub platform: Platform,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Human-readable device name sent with the push token.
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Device model sent with the push token.
    #[serde(default = "default_device_model")]
    pub device_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            platform: default_platform(),
            log_level: default_log_level(),
            device_name: default_device_name(),
            device_model: default_device_model(),
        }
    }
}

impl AppConfig {
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: self.device_name.clone(),
            model: self.device_model.clone(),
        }
    }
}

fn default_app_name() -> String {
    "tether".to_string()
}

fn default_platform() -> Platform {
    Platform::Android
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_device_name() -> String {
    "Unknown device".to_string()
}

fn default_device_model() -> String {
    "unknown".to_string()
}

/// REST backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL all endpoint paths are appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tether").join("tether.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "tether.db".to_string())
}

/// Push notification delivery timings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Delay before navigating to the incoming-call screen, letting the
    /// navigation stack settle after a foreground transition.
    #[serde(default = "default_call_navigation_delay_ms")]
    pub call_navigation_delay_ms: u64,

    /// Delay before handling a notification that resumed the app from background.
    #[serde(default = "default_opened_delay_ms")]
    pub opened_delay_ms: u64,

    /// Attempts for handling the notification that launched a killed app.
    #[serde(default = "default_cold_start_attempts")]
    pub cold_start_attempts: u32,

    /// Fixed pause between cold-start attempts.
    #[serde(default = "default_cold_start_backoff_ms")]
    pub cold_start_backoff_ms: u64,

    /// How long an in-app banner stays up without interaction.
    #[serde(default = "default_banner_dismiss_ms")]
    pub banner_dismiss_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            call_navigation_delay_ms: default_call_navigation_delay_ms(),
            opened_delay_ms: default_opened_delay_ms(),
            cold_start_attempts: default_cold_start_attempts(),
            cold_start_backoff_ms: default_cold_start_backoff_ms(),
            banner_dismiss_ms: default_banner_dismiss_ms(),
        }
    }
}

impl NotificationConfig {
    pub fn call_navigation_delay(&self) -> Duration {
        Duration::from_millis(self.call_navigation_delay_ms)
    }

    pub fn opened_delay(&self) -> Duration {
        Duration::from_millis(self.opened_delay_ms)
    }

    pub fn cold_start_backoff(&self) -> Duration {
        Duration::from_millis(self.cold_start_backoff_ms)
    }

    pub fn banner_dismiss(&self) -> Duration {
        Duration::from_millis(self.banner_dismiss_ms)
    }
}

fn default_call_navigation_delay_ms() -> u64 {
    200
}

fn default_opened_delay_ms() -> u64 {
    500
}

fn default_cold_start_attempts() -> u32 {
    5
}

fn default_cold_start_backoff_ms() -> u64 {
    300
}

fn default_banner_dismiss_ms() -> u64 {
    4000
}

/// What `start_call`/`join_call` do while another session is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Force-end the live session, then start the new one.
    #[default]
    EndPrevious,
    /// Refuse the new session.
    Reject,
}

/// Voice call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CallConfig {
    /// Voice service application identity. `None` disables calling.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Seconds an outgoing call may stay unanswered before it is force-ended.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Policy for a new session while one is live.
    #[serde(default)]
    pub busy_policy: BusyPolicy,

    /// Seconds the SOS dialer waits on each guardian before moving on.
    #[serde(default = "default_sos_attempt_timeout_secs")]
    pub sos_attempt_timeout_secs: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            busy_policy: BusyPolicy::default(),
            sos_attempt_timeout_secs: default_sos_attempt_timeout_secs(),
        }
    }
}

impl CallConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn sos_attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.sos_attempt_timeout_secs)
    }
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_sos_attempt_timeout_secs() -> u64 {
    35
}
