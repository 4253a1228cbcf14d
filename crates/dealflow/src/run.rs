// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dealflow run` command implementation.
//!
//! Assembles the full stack and drives the scheduler on a fixed tick
//! until interrupted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dealflow_config::model::DealflowConfig;
use dealflow_core::DealflowError;
use dealflow_email::EmailSender;
use dealflow_notify::{Dispatcher, InAppSender, Scheduler};
use dealflow_sms::SmsSender;
use dealflow_storage::{Database, SqliteStorage};
use dealflow_telegram::TelegramSender;
use tracing::{error, info};

/// Wire storage, senders, dispatcher, and scheduler from configuration.
pub async fn build_scheduler(config: &DealflowConfig) -> Result<Scheduler, DealflowError> {
    let db = Database::open_with_wal(&config.storage.database_path, config.storage.wal_mode)
        .await?;
    let storage = Arc::new(SqliteStorage::new(db));

    let mut dispatcher = Dispatcher::new(storage.clone());
    dispatcher.register(Arc::new(SmsSender::new(config.sms.clone())));
    dispatcher.register(Arc::new(TelegramSender::new(config.telegram.clone())));
    dispatcher.register(Arc::new(EmailSender::new(&config.email)));
    dispatcher.register(Arc::new(InAppSender::new(storage.clone())));

    Ok(Scheduler::new(
        Arc::new(dispatcher),
        storage,
        config.scheduler.batch_size,
    ))
}

/// Run the periodic due-notification loop until Ctrl-C.
pub async fn run(config: &DealflowConfig) -> Result<(), DealflowError> {
    let scheduler = build_scheduler(config).await?;
    let mut tick =
        tokio::time::interval(Duration::from_secs(config.scheduler.tick_interval_secs));

    info!(
        interval_secs = config.scheduler.tick_interval_secs,
        batch_size = config.scheduler.batch_size,
        "scheduler loop started"
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match scheduler.process_due(Utc::now()).await {
                    Ok(0) => {}
                    Ok(count) => info!(count, "processed due notifications"),
                    // One bad tick must not kill the loop.
                    Err(e) => error!(error = %e, "tick failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                return Ok(());
            }
        }
    }
}
