// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response body shapes shared by the backend endpoints.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode `body`, accepting both the bare form and `{"data": ...}`.
pub(crate) fn unwrap_data<T: DeserializeOwned>(body: Value) -> Result<T, serde_json::Error> {
    if let Value::Object(map) = &body {
        if let Some(inner) = map.get("data") {
            if let Ok(decoded) = T::deserialize(inner) {
                return Ok(decoded);
            }
        }
    }
    serde_json::from_value(body)
}

/// Best human-readable message from an error body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<Value>,
        error: Option<Value>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

#[derive(Debug, Deserialize)]
pub(crate) struct JoinResponse {
    pub token: String,
}
