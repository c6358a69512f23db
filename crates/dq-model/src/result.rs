use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::suite::ExpectationConfiguration;

/// Maximum number of unexpected values kept per expectation.
pub const PARTIAL_UNEXPECTED_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentifier {
    pub run_name: String,
    pub run_time: DateTime<Utc>,
}

impl RunIdentifier {
    pub fn new(run_name: impl Into<String>, run_time: DateTime<Utc>) -> Self {
        Self {
            run_name: run_name.into(),
            run_time,
        }
    }

    /// Run time formatted for use as a path segment.
    pub fn run_time_key(&self) -> String {
        self.run_time.format("%Y%m%dT%H%M%S%.6fZ").to_string()
    }
}

/// Counts and samples describing how a table met one expectation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectationOutcome {
    pub element_count: u64,
    pub missing_count: u64,
    pub unexpected_count: u64,
    pub unexpected_percent: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_unexpected_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub raised_exception: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
}

impl ExceptionInfo {
    pub fn raised(message: impl Into<String>) -> Self {
        Self {
            raised_exception: true,
            exception_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationValidationResult {
    pub success: bool,
    pub expectation_config: ExpectationConfiguration,
    pub result: ExpectationOutcome,
    #[serde(default)]
    pub exception_info: ExceptionInfo,
}

impl ExpectationValidationResult {
    pub fn column(&self) -> Option<&str> {
        self.expectation_config.column()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatistics {
    pub evaluated_expectations: usize,
    pub successful_expectations: usize,
    pub unsuccessful_expectations: usize,
    pub success_percent: Option<f64>,
}

impl ValidationStatistics {
    pub fn from_results(results: &[ExpectationValidationResult]) -> Self {
        let evaluated = results.len();
        let successful = results.iter().filter(|result| result.success).count();
        let success_percent = if evaluated == 0 {
            None
        } else {
            Some(successful as f64 / evaluated as f64 * 100.0)
        };
        Self {
            evaluated_expectations: evaluated,
            successful_expectations: successful,
            unsuccessful_expectations: evaluated - successful,
            success_percent,
        }
    }
}

/// The outcome of running one suite against one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub expectation_suite_name: String,
    pub run_id: RunIdentifier,
    pub batch_id: String,
    pub data_asset_name: String,
    pub results: Vec<ExpectationValidationResult>,
    pub statistics: ValidationStatistics,
}

impl ValidationResult {
    pub fn new(
        expectation_suite_name: impl Into<String>,
        run_id: RunIdentifier,
        batch_id: impl Into<String>,
        data_asset_name: impl Into<String>,
        results: Vec<ExpectationValidationResult>,
    ) -> Self {
        let statistics = ValidationStatistics::from_results(&results);
        Self {
            success: results.iter().all(|result| result.success),
            expectation_suite_name: expectation_suite_name.into(),
            run_id,
            batch_id: batch_id.into(),
            data_asset_name: data_asset_name.into(),
            results,
            statistics,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExpectationValidationResult> {
        self.results.iter().filter(|result| !result.success)
    }
}

/// The outcome of a checkpoint run across all of its validations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub checkpoint_name: String,
    pub run_id: RunIdentifier,
    pub success: bool,
    pub validation_results: Vec<ValidationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_index: Option<PathBuf>,
}

impl CheckpointResult {
    pub fn new(
        checkpoint_name: impl Into<String>,
        run_id: RunIdentifier,
        validation_results: Vec<ValidationResult>,
    ) -> Self {
        Self {
            checkpoint_name: checkpoint_name.into(),
            run_id,
            success: validation_results.iter().all(|result| result.success),
            validation_results,
            docs_index: None,
        }
    }
}
