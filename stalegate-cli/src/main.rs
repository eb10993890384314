//! Stalegate CLI - Command line interface
//!
//! Runs the staleness tracker by hand, inspects the snapshot store, and
//! imports modules through the gatekeeper with an external build command.
//! Optional settings come from `stalegate.json`.

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

mod commands;
mod config;
mod error;
mod logging;

use crate::commands::Session;
use crate::config::{parse_log_format, parse_log_level, CliConfig, LogConfig, CONFIG_FILE_NAME};
use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "stalegate",
    about = "Incremental-build staleness gatekeeper",
    version
)]
struct Cli {
    /// Configuration file path
    #[arg(long, short, value_name = "CONFIG", default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Snapshot store location (overrides the config file and STALEGATE_CACHE)
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Log format: pretty, compact, json
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<String>,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Touch every dependency of SOURCE that changed since the last run
    Check {
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
    /// Show recorded snapshots and whether each file still matches
    Status,
    /// Drop recorded snapshots so the paths count as first seen
    Forget {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Import modules through the gatekeeper using the configured build command
    Import {
        #[arg(required = true)]
        modules: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig::load(&cli.config)?;

    let mut log_config = LogConfig::from_section(&config.log)?;
    if let Some(level) = &cli.log_level {
        log_config.global = parse_log_level(level)?;
    }
    if let Some(format) = &cli.log_format {
        log_config.format = parse_log_format(format)?;
    }
    logging::init_with_file(&log_config, cli.log_file.as_deref())?;

    let session = Session::new(config, cli.store);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Check { sources } => commands::check(&session, sources, &mut out),
        Command::Status => commands::status(&session, &mut out),
        Command::Forget { paths } => commands::forget(&session, paths, &mut out),
        Command::Import { modules } => commands::import(&session, modules, &mut out),
    }
}
