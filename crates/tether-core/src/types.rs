// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the collaborator traits and the orchestration crates.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Names of the values persisted in the key-value store.
pub mod keys {
    /// Session credential written by the auth flow.
    pub const SESSION_TOKEN: &str = "token";
    /// Device push token registered with the backend.
    pub const DEVICE_TOKEN: &str = "fcmToken";
    /// Device push token captured before any session existed.
    pub const PENDING_DEVICE_TOKEN: &str = "pendingFcmToken";
}

/// Caller name used when a call payload does not name the caller.
pub const UNKNOWN_CALLER: &str = "Unknown";

/// Opaque push token identifying this installation to the push provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceToken(pub String);

impl DeviceToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("{prefix}…")
    }
}

impl From<String> for DeviceToken {
    fn from(value: String) -> Self {
        DeviceToken(value)
    }
}

/// Session credential issued by login. Never printed.
#[derive(Debug, Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        SessionToken(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Mobile OS family, which decides how notification permission is obtained.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    /// Notification permission is granted at install time.
    Android,
    /// Notification permission needs an explicit runtime prompt.
    Ios,
}

/// Device metadata sent along with the push token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub model: String,
}

/// Runtime permissions the core asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum PermissionKind {
    Notifications,
    Microphone,
}

/// Outcome of a permission check or prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Never asked yet; a prompt is still possible.
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

// --- Push payloads ---

/// The display part of a push message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushNotification {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// A push message as delivered by the provider.
///
/// The sender controls the shape, so nothing is guaranteed: every accessor
/// returns `Option` and non-string scalars are tolerated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct InboundPushPayload {
    pub notification: PushNotification,
    pub data: Map<String, Value>,
}

impl InboundPushPayload {
    /// Builds a payload from whatever JSON the provider handed over.
    ///
    /// Non-object inputs yield an empty payload. Non-string `title`/`body`
    /// values are dropped.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            return Self::default();
        };

        let notification = match root.remove("notification") {
            Some(Value::Object(n)) => PushNotification {
                title: n.get("title").and_then(Value::as_str).map(str::to_string),
                body: n.get("body").and_then(Value::as_str).map(str::to_string),
            },
            _ => PushNotification::default(),
        };

        let data = match root.remove("data") {
            Some(Value::Object(d)) => d,
            _ => Map::new(),
        };

        Self { notification, data }
    }

    /// A non-null `data` field.
    pub fn data_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    /// A `data` field rendered as a string. Numbers and booleans are stringified.
    pub fn data_str(&self, key: &str) -> Option<String> {
        self.data_value(key).and_then(scalar_to_string)
    }

    pub fn title(&self) -> Option<&str> {
        self.notification.title.as_deref()
    }

    pub fn body(&self) -> Option<&str> {
        self.notification.body.as_deref()
    }

    /// True when neither a notification part nor any data is present.
    pub fn is_empty(&self) -> bool {
        self.notification == PushNotification::default() && self.data.is_empty()
    }
}

impl From<Value> for InboundPushPayload {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<InboundPushPayload> for Value {
    fn from(payload: InboundPushPayload) -> Self {
        let mut root = Map::new();
        let mut notification = Map::new();
        if let Some(title) = payload.notification.title {
            notification.insert("title".into(), Value::String(title));
        }
        if let Some(body) = payload.notification.body {
            notification.insert("body".into(), Value::String(body));
        }
        if !notification.is_empty() {
            root.insert("notification".into(), Value::Object(notification));
        }
        root.insert("data".into(), Value::Object(payload.data));
        Value::Object(root)
    }
}

/// Renders string, number and boolean JSON values as strings.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalized parameters of an incoming call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallIntent {
    #[serde(default)]
    pub caller_name: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub caller_image: Option<String>,
}

impl CallIntent {
    /// An intent is acted upon when it names a channel or a caller.
    pub fn is_actionable(&self) -> bool {
        !self.channel_id.is_empty() || !self.caller_name.is_empty()
    }

    /// Caller name for display, falling back to [`UNKNOWN_CALLER`].
    pub fn display_name(&self) -> &str {
        if self.caller_name.is_empty() {
            UNKNOWN_CALLER
        } else {
            &self.caller_name
        }
    }
}

/// A displayable, non-call notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericNotification {
    pub title: String,
    pub body: String,
    pub data: Map<String, Value>,
}

impl GenericNotification {
    pub fn from_payload(payload: &InboundPushPayload) -> Self {
        Self {
            title: payload.title().unwrap_or_default().to_string(),
            body: payload.body().unwrap_or_default().to_string(),
            data: payload.data.clone(),
        }
    }

    /// Screen to open when the notification is tapped.
    pub fn screen(&self) -> Option<&str> {
        self.data
            .get("screen")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Parameters for [`screen`](Self::screen). A JSON string is decoded; an
    /// undecodable string yields an empty object.
    pub fn params(&self) -> Value {
        match self.data.get("params") {
            Some(Value::String(raw)) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Map::new()))
            }
            Some(v) if !v.is_null() => v.clone(),
            _ => Value::Object(Map::new()),
        }
    }
}

/// Events emitted by the push provider SDK.
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// Message received while the app is in the foreground.
    Foreground(InboundPushPayload),
    /// The user opened the app from a notification while it was backgrounded.
    Opened(InboundPushPayload),
    /// Message delivered to the headless background handler.
    Background(InboundPushPayload),
    /// The provider rotated the device token.
    TokenRefresh(DeviceToken),
}

// --- Navigation ---

/// Destinations the core navigates to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    IncomingCall,
    ActiveCall,
    /// Any other screen, by name (e.g. from a notification's `data.screen`).
    Screen(String),
}

impl Route {
    pub fn name(&self) -> &str {
        match self {
            Route::IncomingCall => "IncomingCall",
            Route::ActiveCall => "ActiveCall",
            Route::Screen(name) => name,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Params for [`Route::IncomingCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCallParams {
    pub caller_name: String,
    pub channel_id: String,
    pub caller_image: Option<String>,
}

impl From<&CallIntent> for IncomingCallParams {
    fn from(intent: &CallIntent) -> Self {
        Self {
            caller_name: intent.display_name().to_string(),
            channel_id: intent.channel_id.clone(),
            caller_image: intent.caller_image.clone(),
        }
    }
}

/// Params for [`Route::ActiveCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCallParams {
    pub channel_id: String,
    pub recipient_name: String,
    pub is_incoming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// --- Voice engine ---

/// Events emitted by the real-time voice engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The local user joined `channel`.
    JoinSuccess { channel: String, uid: u32 },
    /// A remote user joined the channel.
    RemoteJoined { uid: u32 },
    /// A remote user left or dropped.
    RemoteLeft { uid: u32 },
    /// The engine reported an error.
    Error { code: i32, message: String },
}

// --- Backend ---

/// Body of the device token registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub token: String,
    pub device_name: String,
    pub device_model: String,
}

/// Response of the call initiate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedCall {
    pub channel_name: String,
    pub token: String,
}

/// One entry of the backend call history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub channel_name: String,
    #[serde(default)]
    pub caller_id: Option<String>,
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
}

// --- Alerts ---

/// Category of a user-facing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AlertKind {
    PermissionDenied,
    NetworkUnreachable,
    Unauthenticated,
    CallFailed,
    NoAnswer,
}

/// A blocking alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAlert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl UserAlert {
    pub fn new(kind: AlertKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}
