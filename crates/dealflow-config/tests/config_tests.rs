// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Dealflow configuration system.

use dealflow_config::diagnostic::ConfigError;
use dealflow_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_dealflow_config() {
    let toml = r#"
[service]
name = "dealership-east"
log_level = "debug"

[storage]
database_path = "/tmp/dealflow-test.db"
wal_mode = false

[sms]
api_key = "sms-key-123"
line_number = "30007"
api_base = "http://localhost:9090/v1"

[telegram]
bot_token = "123:ABC"

[email]
transport = "relay"
smtp_host = "smtp.example.com"
smtp_port = 465
username = "mailer"
password = "secret"
from_address = "credit@example.com"

[scheduler]
batch_size = 25
tick_interval_secs = 60
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "dealership-east");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/dealflow-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.sms.api_key.as_deref(), Some("sms-key-123"));
    assert_eq!(config.sms.line_number.as_deref(), Some("30007"));
    assert_eq!(config.sms.api_base, "http://localhost:9090/v1");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.email.transport, "relay");
    assert_eq!(config.email.smtp_port, 465);
    assert_eq!(config.email.from_address, "credit@example.com");
    assert_eq!(config.scheduler.batch_size, 25);
    assert_eq!(config.scheduler.tick_interval_secs, 60);
}

/// Unknown field in [sms] section produces an UnknownField error.
#[test]
fn unknown_field_in_sms_produces_error() {
    let toml = r#"
[sms]
api_ky = "test"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("api_ky"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "dealflow");
    assert_eq!(config.service.log_level, "info");
    assert!(config.sms.api_key.is_none());
    assert!(config.sms.line_number.is_none());
    assert!(config.telegram.bot_token.is_none());
    assert_eq!(config.telegram.api_base, "https://api.telegram.org");
    assert_eq!(config.email.transport, "localhost");
    assert_eq!(config.email.smtp_port, 587);
    assert_eq!(config.scheduler.batch_size, 100);
    assert_eq!(config.scheduler.tick_interval_secs, 300);
    assert!(config.storage.wal_mode);
}

/// Environment variable DEALFLOW_SMS_API_KEY maps to sms.api_key (not sms.api.key).
#[test]
fn env_var_section_mapping_preserves_underscored_keys() {
    use figment::Jail;

    Jail::expect_with(|jail| {
        jail.set_env("DEALFLOW_SMS_API_KEY", "from-env");
        jail.set_env("DEALFLOW_SCHEDULER_BATCH_SIZE", "7");

        let config = dealflow_config::load_config().expect("env overrides should parse");
        assert_eq!(config.sms.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.scheduler.batch_size, 7);
        Ok(())
    });
}

/// load_and_validate_str surfaces validation errors as diagnostics.
#[test]
fn validation_errors_surface_as_diagnostics() {
    let toml = r#"
[sms]
api_key = "key-without-line"

[scheduler]
batch_size = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// A typo'd key gets a "did you mean" suggestion.
#[test]
fn typo_produces_suggestion() {
    let toml = r#"
[telegram]
bot_tken = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject typo");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { suggestion: Some(s), .. } if s == "bot_token"
        )
    });
    assert!(found, "expected bot_token suggestion, got: {errors:?}");
}
