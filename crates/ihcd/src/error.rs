//! Daemon error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid configuration: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
