// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dealflow doctor` command implementation.
//!
//! Quick diagnostic checks: configuration sanity, database availability,
//! and which notification channels are actually configured.

use dealflow_config::model::DealflowConfig;
use dealflow_core::DealflowError;
use dealflow_storage::Database;

#[derive(Debug, PartialEq, Eq)]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    message: String,
}

pub async fn run_doctor(config: &DealflowConfig) -> Result<(), DealflowError> {
    let mut results = Vec::new();

    results.push(check_database(config).await);
    results.push(check_sms(config));
    results.push(check_telegram(config));
    results.push(check_email(config));

    println!();
    println!("  dealflow doctor");
    println!("  {}", "-".repeat(50));

    let mut failed = false;
    for result in &results {
        let symbol = match result.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => {
                failed = true;
                "FAIL"
            }
        };
        println!("  [{symbol:>4}] {:<20} {}", result.name, result.message);
    }
    println!();

    if failed {
        return Err(DealflowError::Internal(
            "one or more doctor checks failed".into(),
        ));
    }
    Ok(())
}

async fn check_database(config: &DealflowConfig) -> CheckResult {
    match Database::open_with_wal(&config.storage.database_path, config.storage.wal_mode).await {
        Ok(db) => {
            let message = format!("open, migrations applied ({})", config.storage.database_path);
            match db.close().await {
                Ok(()) => CheckResult {
                    name: "database",
                    status: CheckStatus::Pass,
                    message,
                },
                Err(e) => CheckResult {
                    name: "database",
                    status: CheckStatus::Warn,
                    message: format!("opened but close failed: {e}"),
                },
            }
        }
        Err(e) => CheckResult {
            name: "database",
            status: CheckStatus::Fail,
            message: format!("cannot open: {e}"),
        },
    }
}

fn check_sms(config: &DealflowConfig) -> CheckResult {
    let configured = config.sms.api_key.is_some() && config.sms.line_number.is_some();
    CheckResult {
        name: "sms",
        status: if configured {
            CheckStatus::Pass
        } else {
            CheckStatus::Warn
        },
        message: if configured {
            format!("configured ({})", config.sms.api_base)
        } else {
            "not configured, sms sends will be logged as failed".into()
        },
    }
}

fn check_telegram(config: &DealflowConfig) -> CheckResult {
    let configured = config.telegram.bot_token.is_some();
    CheckResult {
        name: "telegram",
        status: if configured {
            CheckStatus::Pass
        } else {
            CheckStatus::Warn
        },
        message: if configured {
            "bot token present".into()
        } else {
            "not configured, telegram sends will be logged as failed".into()
        },
    }
}

fn check_email(config: &DealflowConfig) -> CheckResult {
    match config.email.transport.as_str() {
        "localhost" => CheckResult {
            name: "email",
            status: CheckStatus::Pass,
            message: "localhost transport".into(),
        },
        "relay" if config.email.smtp_host.is_some() => CheckResult {
            name: "email",
            status: CheckStatus::Pass,
            message: format!(
                "relay via {}:{}",
                config.email.smtp_host.as_deref().unwrap_or_default(),
                config.email.smtp_port
            ),
        },
        "relay" => CheckResult {
            name: "email",
            status: CheckStatus::Fail,
            message: "relay transport selected but smtp_host is missing".into(),
        },
        other => CheckResult {
            name: "email",
            status: CheckStatus::Fail,
            message: format!("unknown transport `{other}`"),
        },
    }
}
