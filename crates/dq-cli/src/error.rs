use dq_fetch::FetchError;
use dq_ingest::IngestError;
use dq_model::ModelError;
use dq_report::ReportError;
use dq_suite::SuiteError;
use dq_validate::CheckpointError;
use thiserror::Error;

use crate::config::ConfigError;

/// Any failure that stops a run before it produces a validation outcome.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("transfer failed: {0}")]
    Transfer(#[from] FetchError),

    #[error("failed to parse CSV: {0}")]
    Parse(#[from] IngestError),

    #[error(transparent)]
    Suite(#[from] SuiteError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("configuration error: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl RunError {
    /// Stable category name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transfer(_) => "transfer_error",
            Self::Parse(_) | Self::Checkpoint(CheckpointError::Ingest(_)) => "parse_error",
            Self::Suite(SuiteError::NotFound { .. }) => "suite_not_found",
            Self::Checkpoint(err) if err.is_suite_not_found() => "suite_not_found",
            Self::Report(_) | Self::Checkpoint(CheckpointError::Report(_)) => "io_error",
            Self::Config(_) | Self::Model(_) | Self::Suite(_) | Self::Checkpoint(_) => {
                "configuration_error"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn suite_not_found_is_reported_as_such() {
        let direct = RunError::from(SuiteError::NotFound {
            name: "a.b".to_string(),
            root: PathBuf::from("gx"),
        });
        assert_eq!(direct.kind(), "suite_not_found");

        let wrapped = RunError::from(CheckpointError::Suite(SuiteError::NotFound {
            name: "a.b".to_string(),
            root: PathBuf::from("gx"),
        }));
        assert_eq!(wrapped.kind(), "suite_not_found");
    }

    #[test]
    fn unknown_action_is_configuration() {
        let err = RunError::from(ModelError::UnknownAction("notify".to_string()));
        assert_eq!(err.kind(), "configuration_error");
    }
}
