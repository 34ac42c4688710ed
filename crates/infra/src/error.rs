//! Infrastructure error model.

use std::path::PathBuf;

use pantry_core::DomainError;
use thiserror::Error;

/// Local persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error in {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(table: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            table: table.into(),
            source,
        }
    }
}

/// Remote push failure. Never fatal: it ends up in a `SyncStatus::Failed`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),
    #[error("remote API error ({0}): {1}")]
    Api(u16, String),
    #[error("client setup failed: {0}")]
    Client(String),
}

/// Failure of a `Pantry` operation. In-memory state is unchanged when this
/// is returned.
#[derive(Debug, Error)]
pub enum PantryError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
