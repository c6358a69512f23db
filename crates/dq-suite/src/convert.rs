//! YAML expectation definitions to canonical suite JSON.

use std::fs;
use std::path::{Path, PathBuf};

use dq_model::ExpectationSuite;
use tracing::{info, warn};

use crate::error::{Result, SuiteError};
use crate::store::{SaveOutcome, SuiteStore, read_suite_json, write_suite_json};

/// Outcome of a conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub suite_name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub expectations: usize,
    /// `None` when written to an explicit output path.
    pub outcome: Option<SaveOutcome>,
}

/// Parse a YAML suite definition.
pub fn read_suite_yaml(path: &Path) -> Result<ExpectationSuite> {
    let text = fs::read_to_string(path).map_err(|e| SuiteError::io(path, e))?;
    serde_yaml::from_str(&text).map_err(|source| SuiteError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a suite from JSON or YAML, picked by file extension.
pub fn read_suite_file(path: &Path) -> Result<ExpectationSuite> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("yaml" | "yml") => read_suite_yaml(path),
        _ => read_suite_json(path),
    }
}

/// Convert a YAML definition and write it as JSON.
///
/// Without `output` the suite is registered in `store` at the path its name
/// maps to, so the name and the location always agree.
pub fn convert_yaml(
    yaml_path: &Path,
    store: &SuiteStore,
    output: Option<&Path>,
) -> Result<Conversion> {
    let suite = read_suite_yaml(yaml_path)?;
    crate::paths::name_segments(suite.name())?;

    let (destination, outcome) = match output {
        Some(path) => {
            write_suite_json(path, &suite)?;
            let canonical = crate::paths::suite_path(store.root(), suite.name())?;
            if canonical != path {
                warn!(
                    suite = suite.name(),
                    path = %path.display(),
                    expected = %canonical.display(),
                    "converted suite written outside its name-derived location"
                );
            }
            (path.to_path_buf(), None)
        }
        None => {
            let (path, outcome) = store.add_or_update(&suite)?;
            (path, Some(outcome))
        }
    };

    info!(
        suite = suite.name(),
        source = %yaml_path.display(),
        destination = %destination.display(),
        expectations = suite.expectations.len(),
        "suite converted"
    );
    Ok(Conversion {
        suite_name: suite.name().to_string(),
        source: yaml_path.to_path_buf(),
        destination,
        expectations: suite.expectations.len(),
        outcome,
    })
}
