// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dealflow.toml` > `~/.config/dealflow/dealflow.toml`
//! > `/etc/dealflow/dealflow.toml` with environment variable overrides via
//! the `DEALFLOW_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DealflowConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dealflow/dealflow.toml` (system-wide)
/// 3. `~/.config/dealflow/dealflow.toml` (user XDG config)
/// 4. `./dealflow.toml` (local directory)
/// 5. `DEALFLOW_*` environment variables
pub fn load_config() -> Result<DealflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DealflowConfig::default()))
        .merge(Toml::file("/etc/dealflow/dealflow.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dealflow/dealflow.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dealflow.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DealflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DealflowConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DealflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DealflowConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `DEALFLOW_SMS_API_KEY` must map to
/// `sms.api_key`, not `sms.api.key`.
fn env_provider() -> Env {
    Env::prefixed("DEALFLOW_").map(|key| {
        // The mapper receives the prefix-stripped key in its original
        // uppercase. Example: DEALFLOW_SMS_API_KEY -> "SMS_API_KEY"
        let key = key.as_str().to_ascii_lowercase();
        let mapped = key
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("sms_", "sms.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("email_", "email.", 1)
            .replacen("scheduler_", "scheduler.", 1);
        mapped.into()
    })
}
