//! Transfer errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while moving an object from storage to local disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The location string could not be understood.
    #[error("invalid object location: {0}")]
    InvalidLocation(String),

    /// The bucket exists (or is reachable) but the object does not.
    #[error("object not found: {location}")]
    NotFound { location: String },

    /// Credentials were rejected or lack permission.
    #[error("access denied to {location} (HTTP {status})")]
    Unauthorized { location: String, status: u16 },

    /// Any other non-success HTTP status.
    #[error("unexpected HTTP {status} fetching {location}: {message}")]
    Http {
        location: String,
        status: u16,
        message: String,
    },

    /// Connection, TLS or timeout failure.
    #[error("network error fetching {location}: {source}")]
    Network {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    /// No usable credentials could be obtained.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// Reading the source object failed part-way.
    #[error("transfer of {location} interrupted: {source}")]
    Interrupted {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The destination path cannot be created or written.
    #[error("destination not writable {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn destination(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Destination {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

