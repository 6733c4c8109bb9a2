// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tether - client core of a parental supervision app.
//!
//! This is the binary entry point: a payload simulator and a config checker.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use simulate::DeliveryState;
use tether_config::{ConfigError, TetherConfig};

/// Tether - client core of a parental supervision app.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about, long_about = None)]
struct Cli {
    /// Explicit config file. Defaults to the XDG lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a push payload (JSON file) through the notification pipeline.
    Simulate {
        payload: PathBuf,
        /// App state at delivery.
        #[arg(long, value_enum, default_value = "foreground")]
        state: DeliveryState,
        /// Use the SQLite store from `[storage]` instead of memory.
        #[arg(long)]
        persistent: bool,
    },
    /// Load and validate configuration, then report problems.
    CheckConfig {
        /// Print the effective configuration as TOML.
        #[arg(long)]
        print: bool,
    },
}

fn load(path: Option<&std::path::Path>) -> Result<TetherConfig, Vec<ConfigError>> {
    match path {
        Some(path) => tether_config::load_and_validate_path(path),
        None => tether_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            tether_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Simulate {
            payload,
            state,
            persistent,
        }) => {
            init_tracing(&config.app.log_level);
            if let Err(e) = simulate::run_simulate(config, &payload, state, persistent).await {
                eprintln!("tether simulate: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig { print }) => {
            eprintln!(
                "tether: config ok (app.name={}, platform={})",
                config.app.name, config.app.platform
            );
            if print {
                match toml::to_string_pretty(&config) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(e) => {
                        eprintln!("tether check-config: cannot render config: {e}");
                        std::process::exit(1);
                    }
                }
            }
        }
        None => {
            println!("tether: use --help for available commands");
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tether={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
