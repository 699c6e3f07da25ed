//! The single error type returned at the source boundary.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by both sources and the coordinator.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Everything a file or table operation can fail with.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file, database, or table does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The database could not be opened.
    #[error("could not connect to {target}")]
    ConnectionFailed {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Row or header shape does not fit the target.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A statement failed after the connection was established.
    #[error("failed to {action}")]
    QueryFailed {
        action: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The delimited text could not be parsed or written.
    #[error("malformed delimited text in {}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A background load ended without reporting a result.
    #[error("background load ended without a result")]
    WorkerLost,
}

/// Coarse failure categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceNotFound,
    ConnectionFailed,
    SchemaMismatch,
    QueryFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::SourceNotFound => "source not found",
            ErrorKind::ConnectionFailed => "connection failed",
            ErrorKind::SchemaMismatch => "schema mismatch",
            ErrorKind::QueryFailed => "query failed",
        };
        f.write_str(label)
    }
}

impl SourceError {
    /// Fold the detailed variant into the category callers branch on. File
    /// read/write failures count as failed queries; a lost worker counts as
    /// a failed connection.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::NotFound(_) => ErrorKind::SourceNotFound,
            SourceError::ConnectionFailed { .. } | SourceError::WorkerLost => {
                ErrorKind::ConnectionFailed
            }
            SourceError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            SourceError::QueryFailed { .. } | SourceError::Io { .. } | SourceError::Format { .. } => {
                ErrorKind::QueryFailed
            }
        }
    }

    pub(crate) fn query(action: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> Self {
        let action = action.into();
        move |source| SourceError::QueryFailed { action, source }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| SourceError::Io { path, source }
    }

    pub(crate) fn format(path: impl Into<PathBuf>) -> impl FnOnce(csv::Error) -> Self {
        let path = path.into();
        move |source| SourceError::Format { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_folds_into_a_category() {
        assert_eq!(
            SourceError::NotFound("data.csv".into()).kind(),
            ErrorKind::SourceNotFound
        );
        assert_eq!(
            SourceError::SchemaMismatch("row 1".into()).kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(SourceError::WorkerLost.kind(), ErrorKind::ConnectionFailed);

        let io_err = SourceError::io("out.csv")(io::Error::other("disk full"));
        assert_eq!(io_err.kind(), ErrorKind::QueryFailed);
        assert_eq!(io_err.to_string(), "I/O error on out.csv");
    }

    #[test]
    fn query_errors_keep_the_driver_error_as_source() {
        let err = SourceError::query("select rows")(rusqlite::Error::InvalidQuery);
        assert_eq!(err.to_string(), "failed to select rows");
        assert!(std::error::Error::source(&err).is_some());
    }
}
