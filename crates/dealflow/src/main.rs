// SPDX-FileCopyrightText: 2026 Dealflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dealflow - credit inquiry workflow engine.
//!
//! Binary entry point: loads configuration, wires the storage, channel
//! senders, dispatcher, and scheduler together, and runs the periodic
//! due-notification loop.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod run;

use clap::{Parser, Subcommand};

/// Dealflow - credit inquiry workflow engine.
#[derive(Parser, Debug)]
#[command(name = "dealflow", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler loop, processing due notifications on a tick.
    Run,
    /// Run diagnostic checks against configuration and storage.
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match dealflow_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            dealflow_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.service.log_level)
            }),
        )
        .init();

    let result = match cli.command {
        Some(Commands::Run) | None => run::run(&config).await,
        Some(Commands::Doctor) => doctor::run_doctor(&config).await,
    };

    if let Err(e) = result {
        eprintln!("dealflow: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config =
            dealflow_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.service.name, "dealflow");
    }
}
