//! CLI errors

use stalegate_core::GateError;
use stalegate_loader::HookError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("cannot read '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid log format '{0}'")]
    InvalidLogFormat(String),

    #[error("unknown log target '{0}'")]
    UnknownLogTarget(String),

    #[error("cannot open log file '{path}': {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no build command configured; add a \"command\" section to the config file")]
    NoCommand,

    #[error("cannot resolve '{path}': {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}
