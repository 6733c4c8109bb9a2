// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tether configuration system.

use tether_config::diagnostic::ConfigError;
use tether_config::model::{BusyPolicy, TetherConfig};
use tether_config::{load_and_validate_str, load_config_from_path, load_config_from_str};
use tether_core::types::Platform;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tether_config() {
    let toml = r#"
[app]
name = "tether-kids"
platform = "ios"
log_level = "debug"
device_name = "Alice's iPhone"
device_model = "iPhone15,2"

[backend]
base_url = "https://api.example.com/v1"
request_timeout_secs = 5

[storage]
database_path = "/tmp/tether-test.db"

[notifications]
call_navigation_delay_ms = 150
opened_delay_ms = 400
cold_start_attempts = 3
cold_start_backoff_ms = 250
banner_dismiss_ms = 2000

[call]
app_id = "voice-app-123"
connect_timeout_secs = 20
busy_policy = "reject"
sos_attempt_timeout_secs = 25
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "tether-kids");
    assert_eq!(config.app.platform, Platform::Ios);
    assert_eq!(config.app.device_info().model, "iPhone15,2");
    assert_eq!(config.backend.base_url, "https://api.example.com/v1");
    assert_eq!(config.backend.request_timeout_secs, 5);
    assert_eq!(config.storage.database_path, "/tmp/tether-test.db");
    assert_eq!(config.notifications.call_navigation_delay_ms, 150);
    assert_eq!(config.notifications.cold_start_attempts, 3);
    assert_eq!(config.call.app_id.as_deref(), Some("voice-app-123"));
    assert_eq!(config.call.connect_timeout_secs, 20);
    assert_eq!(config.call.busy_policy, BusyPolicy::Reject);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.name, "tether");
    assert_eq!(config.app.platform, Platform::Android);
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.backend.request_timeout_secs, 15);
    assert_eq!(config.notifications.call_navigation_delay_ms, 200);
    assert_eq!(config.notifications.opened_delay_ms, 500);
    assert_eq!(config.notifications.cold_start_attempts, 5);
    assert_eq!(config.notifications.cold_start_backoff_ms, 300);
    assert!(config.call.app_id.is_none());
    assert_eq!(config.call.connect_timeout_secs, 30);
    assert_eq!(config.call.busy_policy, BusyPolicy::EndPrevious);
}

/// Unknown field in [backend] is rejected.
#[test]
fn unknown_field_in_backend_produces_error() {
    let toml = r#"
[backend]
base_ulr = "https://x"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("base_ulr"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unknown key diagnostics carry a suggestion.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = r#"
[call]
conect_timeout_secs = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("connect_timeout_secs"));
}

/// A bad enum value is reported as an invalid value, not a crash.
#[test]
fn unknown_platform_is_rejected() {
    let toml = r#"
[app]
platform = "symbian"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(!errors.is_empty());
}

/// Wrong value type is rejected.
#[test]
fn wrong_type_is_rejected() {
    let toml = r#"
[notifications]
cold_start_attempts = "five"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("cold_start_attempts"))));
}

/// Semantic validation runs after deserialization.
#[test]
fn validation_runs_after_load() {
    let toml = r#"
[backend]
base_url = "ftp://files.example.com"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("base_url"))));
}

/// Dotted overrides (what the env provider produces) land on the right field.
#[test]
fn dotted_override_sets_nested_field() {
    use figment::{providers::Serialized, Figment};

    let config: TetherConfig = Figment::new()
        .merge(Serialized::defaults(TetherConfig::default()))
        .merge(("call.connect_timeout_secs", 45))
        .extract()
        .expect("should set connect_timeout_secs via dot notation");

    assert_eq!(config.call.connect_timeout_secs, 45);
}

/// An explicit file path is honored and env vars still override it.
#[test]
#[serial_test::serial]
fn file_path_loading_with_env_override() {
    let dir = std::env::temp_dir().join(format!("tether-config-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tether.toml");
    std::fs::write(
        &path,
        "[backend]\nbase_url = \"https://from-file.example.com\"\n",
    )
    .unwrap();

    figment::Jail::expect_with(|jail| {
        jail.set_env("TETHER_CALL_CONNECT_TIMEOUT_SECS", "12");
        let config = load_config_from_path(&path).expect("file should load");
        assert_eq!(config.backend.base_url, "https://from-file.example.com");
        assert_eq!(config.call.connect_timeout_secs, 12);
        Ok(())
    });

    std::fs::remove_dir_all(&dir).ok();
}

/// Missing config files are silently skipped.
#[test]
fn missing_config_file_silently_skipped() {
    let config = load_config_from_path(std::path::Path::new("/nonexistent/tether.toml"))
        .expect("missing file should be skipped");
    assert_eq!(config.app.name, "tether");
}
