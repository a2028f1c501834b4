use thiserror::Error;

use crate::config::ConfigError;
use crate::db::StoreError;

/// Fatal conditions surfaced by a command.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot find project: {0}")]
    NotFound(String),

    #[error("{0}")]
    Argument(String),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
