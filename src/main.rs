//! cuhash - Main entrypoint.
//!
//! Loads configuration, initializes logging, and runs a synthetic
//! build-and-query workload against the cuckoo hash table.

use clap::{Parser, Subcommand};
use cuhash_lib::config::{ConfigLoader, CuHashConfig, LogConfig, ENV_PREFIX};
use cuhash_lib::error::{
    CuHashError, CuHashResult, ErrorContext, ErrorReporter, TracingErrorReporter,
};
use cuhash_lib::workload;
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line arguments for cuhash.
#[derive(Parser, Debug)]
#[clap(name = "cuhash", version, author, about)]
struct Args {
    /// Path to configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Print the run report as JSON
    #[clap(long, global = true)]
    json: bool,

    /// Command to execute
    #[clap(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Build a table from a generated workload and query it
    Run,

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[clap(short, long, value_parser)]
        output: PathBuf,
    },
}

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(log: &LogConfig) -> CuHashResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_line_number(log.source_location)
        .with_file(log.source_location)
        .with_thread_names(log.thread_names)
        .with_writer(std::io::stderr);

    let result = if log.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| CuHashError::Custom(format!("Failed to set global tracing subscriber: {e}")))
}

fn execute(command: Command, config: CuHashConfig, json: bool) -> CuHashResult<()> {
    match command {
        Command::Run => {
            info!(
                keys = config.workload.num_keys,
                queries = config.workload.num_queries,
                "Starting run"
            );
            let report = workload::run(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            Ok(())
        }
        Command::Validate => {
            info!("Configuration validated successfully");
            Ok(())
        }
        Command::GenConfig { output } => {
            info!("Generating default configuration");

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml = toml::to_string_pretty(&CuHashConfig::default())?;
            std::fs::write(&output, toml)?;

            info!("Default configuration written to {:?}", output);
            Ok(())
        }
    }
}

/// Main entry point for the application.
fn main() {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Run);
    let reporter = TracingErrorReporter;

    // Generating a config must not depend on the current one being valid.
    let loaded = match command {
        Command::GenConfig { .. } => Ok(CuHashConfig::default()),
        _ => ConfigLoader::new(args.config.as_deref(), ENV_PREFIX).load(),
    };

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            if init_logging(&LogConfig::default()).is_err() {
                eprintln!("Configuration error: {e}");
            }
            reporter.report(
                ErrorContext::new(e.into(), "config")
                    .with_details(format!("config file: {:?}", args.config)),
            );
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.log) {
        eprintln!("{e}");
        process::exit(1);
    }

    if let Err(e) = execute(command, config, args.json) {
        reporter.report(ErrorContext::new(e, "cuhash"));
        process::exit(1);
    }
}
