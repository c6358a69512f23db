//! JSON stores for validation results and evaluation parameters.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dq_model::{RunIdentifier, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ReportError, Result};
use crate::key::ResultKey;

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    let mut text = serde_json::to_string_pretty(value).map_err(|e| ReportError::json(path, e))?;
    text.push('\n');
    fs::write(path, text).map_err(|e| ReportError::io(path, e))
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| ReportError::io(dir, e))?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// Validation results as JSON files keyed by suite, run and batch.
#[derive(Debug, Clone)]
pub struct ValidationsStore {
    base: PathBuf,
}

impl ValidationsStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn path_for(&self, result: &ValidationResult) -> PathBuf {
        self.base
            .join(ResultKey::for_result(result).relative_path("json"))
    }

    pub fn store(&self, result: &ValidationResult) -> Result<PathBuf> {
        let path = self.path_for(result);
        write_json(&path, result)?;
        info!(
            suite = %result.expectation_suite_name,
            path = %path.display(),
            "validation result stored"
        );
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<ValidationResult> {
        let text = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ReportError::json(path, e))
    }

    /// Stored result files, sorted by path.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.base.is_dir() {
            collect_json_files(&self.base, &mut files)?;
        }
        files.sort();
        Ok(files)
    }

    /// Every readable stored result; unreadable files are skipped.
    pub fn load_all(&self) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::new();
        for path in self.list()? {
            match self.load(&path) {
                Ok(result) => results.push(result),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping stored result"),
            }
        }
        debug!(count = results.len(), "stored validation results loaded");
        Ok(results)
    }
}

/// Observed values published by one validation, addressable by URN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationParameters {
    pub expectation_suite_name: String,
    pub run_id: RunIdentifier,
    pub batch_id: String,
    pub parameters: BTreeMap<String, Value>,
}

impl EvaluationParameters {
    pub fn from_result(result: &ValidationResult) -> Self {
        let mut parameters = BTreeMap::new();
        for outcome in &result.results {
            let Some(observed) = &outcome.result.observed_value else {
                continue;
            };
            let mut urn = format!(
                "urn:dq:validations:{}:{}.result.observed_value",
                result.expectation_suite_name, outcome.expectation_config.expectation_type
            );
            if let Some(column) = outcome.column() {
                urn.push_str(":column=");
                urn.push_str(column);
            }
            parameters.insert(urn, observed.clone());
        }
        if let Some(percent) = result.statistics.success_percent {
            parameters.insert(
                format!(
                    "urn:dq:validations:{}:statistics.success_percent",
                    result.expectation_suite_name
                ),
                Value::from(percent),
            );
        }
        Self {
            expectation_suite_name: result.expectation_suite_name.clone(),
            run_id: result.run_id.clone(),
            batch_id: result.batch_id.clone(),
            parameters,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationParameterStore {
    base: PathBuf,
}

impl EvaluationParameterStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn store(&self, result: &ValidationResult) -> Result<PathBuf> {
        let parameters = EvaluationParameters::from_result(result);
        let path = self
            .base
            .join(ResultKey::for_result(result).relative_path("json"));
        write_json(&path, &parameters)?;
        info!(
            suite = %result.expectation_suite_name,
            parameters = parameters.parameters.len(),
            path = %path.display(),
            "evaluation parameters stored"
        );
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<EvaluationParameters> {
        let text = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| ReportError::json(path, e))
    }
}
