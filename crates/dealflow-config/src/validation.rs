// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as known transport names, non-empty paths, and a
//! positive scheduler batch size.

use crate::diagnostic::ConfigError;
use crate::model::DealflowConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const EMAIL_TRANSPORTS: &[&str] = &["localhost", "relay"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DealflowConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.service.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.sms.api_base.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "sms.api_base must not be empty".to_string(),
        });
    }

    // An API key without a registered line number cannot send patterns.
    if config.sms.api_key.is_some() && config.sms.line_number.is_none() {
        errors.push(ConfigError::Validation {
            message: "sms.line_number is required when sms.api_key is set".to_string(),
        });
    }

    if config.telegram.api_base.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "telegram.api_base must not be empty".to_string(),
        });
    }

    if !EMAIL_TRANSPORTS.contains(&config.email.transport.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "email.transport must be one of {}, got `{}`",
                EMAIL_TRANSPORTS.join(", "),
                config.email.transport
            ),
        });
    }

    if config.email.transport == "relay" {
        if config.email.smtp_host.is_none() {
            errors.push(ConfigError::Validation {
                message: "email.smtp_host is required for the relay transport".to_string(),
            });
        }
        if config.email.username.is_none() || config.email.password.is_none() {
            errors.push(ConfigError::Validation {
                message: "email.username and email.password are required for the relay transport"
                    .to_string(),
            });
        }
    }

    if config.email.smtp_port == 0 {
        errors.push(ConfigError::Validation {
            message: "email.smtp_port must be non-zero".to_string(),
        });
    }

    if config.scheduler.batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.batch_size must be at least 1".to_string(),
        });
    }

    if config.scheduler.tick_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.tick_interval_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
