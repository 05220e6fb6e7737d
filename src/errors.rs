// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;

use crate::ledger::CommandId;

#[derive(Error, Debug)]
pub enum RunletError {
    #[error("empty command: argv must contain at least an executable")]
    EmptyCommand,

    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("no command with id {0}")]
    UnknownCommand(CommandId),

    #[error("no command to rerun")]
    NothingToRerun,

    #[error("terminal mode requested but no terminal spawner is configured")]
    TerminalUnavailable,

    #[error("engine is no longer running")]
    EngineClosed,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RunletError>;
