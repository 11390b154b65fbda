//! Crate-level error type.

use std::io;
use thiserror::Error;

use crate::config::ConfigError;
use crate::probe::ProbeError;
use crate::scheduler::ScheduleError;

/// Errors that end a command with a non-zero exit.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("Both --url and --interval are required.")]
    MissingArgument,
    #[error("failed to write log: {0}")]
    Log(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
