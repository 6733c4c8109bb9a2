// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, timing windows, and non-zero attempt counts.

use crate::diagnostic::ConfigError;
use crate::model::TetherConfig;

/// Accepted window for the incoming-call navigation debounce.
const CALL_NAVIGATION_DELAY_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=300;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TetherConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "backend.base_url must not be empty".to_string(),
        });
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("backend.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.backend.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "backend.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` must be one of {}",
                config.app.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let delay = config.notifications.call_navigation_delay_ms;
    if !CALL_NAVIGATION_DELAY_RANGE_MS.contains(&delay) {
        errors.push(ConfigError::Validation {
            message: format!(
                "notifications.call_navigation_delay_ms must be between {} and {}, got {delay}",
                CALL_NAVIGATION_DELAY_RANGE_MS.start(),
                CALL_NAVIGATION_DELAY_RANGE_MS.end()
            ),
        });
    }

    if config.notifications.cold_start_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "notifications.cold_start_attempts must be at least 1".to_string(),
        });
    }

    if config.call.connect_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "call.connect_timeout_secs must be at least 1".to_string(),
        });
    }

    if let Some(app_id) = &config.call.app_id {
        if app_id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "call.app_id must not be blank when set".to_string(),
            });
        }
    }

    if config.call.sos_attempt_timeout_secs < config.call.connect_timeout_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "call.sos_attempt_timeout_secs ({}) must not be shorter than call.connect_timeout_secs ({})",
                config.call.sos_attempt_timeout_secs, config.call.connect_timeout_secs
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
