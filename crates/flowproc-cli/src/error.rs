//! CLI-level errors, all of which terminate the process with exit code 1.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read dataset: {0}")]
    DatasetIo(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    DatasetParse(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    EngineConfig(#[from] flowproc_core::CoreError),
}

pub type CliResult<T> = Result<T, CliError>;
