// Error types for fetching and decoding replay collections.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Errors raised while fetching or decoding replay collections.
///
/// Reader construction itself never fails: an incomplete set of collections
/// yields no reader rather than an error.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay not found: {0}")]
    NotFound(String),
    #[error("invalid replay id: {0:?}")]
    InvalidId(String),
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("chunk stats error: {0}")]
    Chunks(String),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

pub type ReplayResult<T> = Result<T, ReplayError>;

impl ReplayError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn chunks(details: impl fmt::Display) -> Self {
        Self::Chunks(details.to_string())
    }
}
