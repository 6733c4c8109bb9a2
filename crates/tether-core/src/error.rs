// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tether client core.

use thiserror::Error;

use crate::types::{AlertKind, PermissionKind, UserAlert};

/// The primary error type used across all Tether collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum TetherError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Key-value store errors (open failure, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// REST backend errors (transport failure, non-2xx status, bad response body).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Push provider errors (token fetch, invalidation, initial notification lookup).
    #[error("push provider error: {message}")]
    Push {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Voice engine errors (construction, initialization, channel join/leave).
    #[error("voice engine error: {message}")]
    Engine {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Navigator rejected a dispatch.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// A runtime permission was denied by the user.
    #[error("{permission} permission denied")]
    PermissionDenied { permission: PermissionKind },

    /// The device has no network connectivity.
    #[error("network unreachable")]
    NetworkUnreachable,

    /// No session token is stored; the user must log in again.
    #[error("not authenticated")]
    Unauthenticated,

    /// A call is already active and the busy policy rejects new sessions.
    #[error("a call is already in progress on channel {channel_id}")]
    CallInProgress { channel_id: String },

    /// An inbound payload could not be interpreted.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TetherError {
    /// Shorthand for a backend error carrying only a message.
    pub fn backend(message: impl Into<String>) -> Self {
        TetherError::Backend {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Shorthand for an engine error carrying only a message.
    pub fn engine(message: impl Into<String>) -> Self {
        TetherError::Engine {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a push provider error carrying only a message.
    pub fn push(message: impl Into<String>) -> Self {
        TetherError::Push {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error ends a user-initiated action with a blocking alert.
    ///
    /// Only failures with no safe default qualify: denied permissions, no
    /// connectivity, an expired session, and a busy line.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TetherError::PermissionDenied { .. }
                | TetherError::NetworkUnreachable
                | TetherError::Unauthenticated
                | TetherError::CallInProgress { .. }
        )
    }

    /// The alert shown to the user for a user-facing error, `None` otherwise.
    pub fn alert(&self) -> Option<UserAlert> {
        let alert = match self {
            TetherError::PermissionDenied { permission } => UserAlert::new(
                AlertKind::PermissionDenied,
                "Permission required",
                format!("Please allow {permission} access in Settings to continue."),
            ),
            TetherError::NetworkUnreachable => UserAlert::new(
                AlertKind::NetworkUnreachable,
                "No connection",
                "Check your internet connection and try again.",
            ),
            TetherError::Unauthenticated => UserAlert::new(
                AlertKind::Unauthenticated,
                "Session expired",
                "Please log in again.",
            ),
            TetherError::CallInProgress { .. } => UserAlert::new(
                AlertKind::CallFailed,
                "Call in progress",
                "End the current call before starting a new one.",
            ),
            _ => return None,
        };
        Some(alert)
    }
}
