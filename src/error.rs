//! Error type shared by the core and its collaborators.

use std::path::PathBuf;

/// Everything that can go wrong while building a timeline.
///
/// `InvalidArgument` and `InvariantViolation` come from the core and are
/// deterministic for a given input. The remaining variants belong to the
/// record source and the exporter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{}: line {line}: unrecognized timestamp {value:?}", path.display())]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
