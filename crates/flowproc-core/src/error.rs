//! Errors specific to building and running the dispatch engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid engine configuration: {0}")]
    ConfigError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
