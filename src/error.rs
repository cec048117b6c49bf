use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Input that cannot be accepted at the boundary of the crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid reference date '{0}': expected YYYY-MM-DD")]
    ReferenceDate(String),
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    Date(String),
    #[error("invalid time '{0}': expected HH:MM")]
    Time(String),
    #[error("invalid weight '{0}': expected a positive number of kg")]
    Weight(String),
    #[error("invalid frequency: {0}")]
    Frequency(String),
    #[error("unknown routine slot '{0}': expected am, pm or reg")]
    Slot(String),
    #[error("walk ends ({end}) before it starts ({start})")]
    WalkRange { start: String, end: String },
}

/// Errors surfaced by storage and command operations.
#[derive(Debug, Error)]
pub enum CareError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to access care data at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("care data at {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode care data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: &'static str, name: String },
}

impl CareError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CareError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        CareError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        CareError::Duplicate {
            kind,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CareError>;
