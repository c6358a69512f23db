//! Parse errors for CSV ingestion.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },

    #[error("{path}: header field {index} is empty")]
    EmptyHeader { path: PathBuf, index: usize },

    #[error("{path}: duplicate column {name:?}")]
    DuplicateColumn { path: PathBuf, name: String },

    #[error("{path}:{line}: expected {expected} fields, found {found}")]
    RaggedRow {
        path: PathBuf,
        line: u64,
        expected: u64,
        found: u64,
    },

    #[error("{path}:{line}: invalid UTF-8")]
    Encoding { path: PathBuf, line: u64 },

    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },
}

impl IngestError {
    pub(crate) fn from_csv(path: &std::path::Path, err: csv::Error) -> Self {
        let path = path.to_path_buf();
        if err.is_io_error() {
            return match err.into_kind() {
                csv::ErrorKind::Io(source) => Self::Io { path, source },
                other => Self::CsvParse {
                    path,
                    message: format!("{other:?}"),
                },
            };
        }
        match err.kind() {
            csv::ErrorKind::UnequalLengths {
                pos,
                expected_len,
                len,
            } => Self::RaggedRow {
                path,
                line: pos.as_ref().map_or(0, csv::Position::line),
                expected: *expected_len,
                found: *len,
            },
            csv::ErrorKind::Utf8 { pos, .. } => Self::Encoding {
                path,
                line: pos.as_ref().map_or(0, csv::Position::line),
            },
            _ => Self::CsvParse {
                path,
                message: err.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
