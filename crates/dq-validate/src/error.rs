use std::path::PathBuf;

use dq_ingest::IngestError;
use dq_model::ModelError;
use dq_report::ReportError;
use dq_suite::SuiteError;
use thiserror::Error;

/// Errors raised while setting up or running a checkpoint.
///
/// Suite, ingest, report and I/O failures wrap their source; every other
/// variant is a configuration problem.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("context root {root} is not a directory")]
    MissingContextRoot { root: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("checkpoint {name:?} not found at {path}")]
    CheckpointNotFound { name: String, path: PathBuf },

    #[error("checkpoint {name:?} has no validations")]
    NoValidations { name: String },

    #[error("datasource {name:?} is not declared in the data context")]
    UnknownDatasource { name: String },

    #[error("datasource {datasource:?} expects data connector {expected:?}, got {found:?}")]
    ConnectorMismatch {
        datasource: String,
        expected: String,
        found: String,
    },

    #[error("batch request for datasource {datasource:?} has an empty data_asset_name")]
    EmptyAssetName { datasource: String },

    #[error("runtime batch request for {asset:?} needs at least one batch identifier")]
    MissingBatchIdentifiers { asset: String },

    #[error("no runtime batch supplied for data asset {asset:?}")]
    MissingRuntimeBatch { asset: String },

    #[error("data asset {asset:?} not found under {base}")]
    AssetNotFound { asset: String, base: PathBuf },

    #[error("datasource {datasource:?}: delimiter {delimiter:?} is not a single ASCII character")]
    InvalidDelimiter { datasource: String, delimiter: char },

    #[error("invalid run name template {template:?}")]
    RunNameTemplate { template: String },

    #[error("invalid regex {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("suite {suite:?}: {source}")]
    Expectation {
        suite: String,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Suite(#[from] SuiteError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl CheckpointError {
    pub fn is_suite_not_found(&self) -> bool {
        matches!(self, Self::Suite(SuiteError::NotFound { .. }))
    }

    /// True for problems with the context, checkpoint or suite configuration.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Suite(_) | Self::Ingest(_) | Self::Report(_) | Self::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, CheckpointError>;
