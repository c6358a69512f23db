//! Suite name to file path mapping.
//!
//! A dotted suite name `surveys.developer_salaries.csv_schema_warning` lives
//! at `<root>/expectations/surveys/developer_salaries/csv_schema_warning.json`.
//! Only dots separate segments; slash-separated names are not accepted.

use std::path::{Path, PathBuf};

use crate::error::{Result, SuiteError};

/// Directory under the context root that holds suite files.
pub const EXPECTATIONS_DIR: &str = "expectations";

/// Extension of persisted suites.
pub const SUITE_EXTENSION: &str = "json";

/// Split a suite name into path segments, rejecting anything ambiguous.
pub fn name_segments(name: &str) -> Result<Vec<&str>> {
    let invalid = |message: &str| SuiteError::InvalidName {
        name: name.to_string(),
        message: message.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.trim() != name {
        return Err(invalid("name has leading or trailing whitespace"));
    }
    let segments: Vec<&str> = name.split('.').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(invalid("name has an empty segment"));
        }
        if segment.contains(['/', '\\', ':']) {
            return Err(invalid("segments are separated by '.', not path separators"));
        }
    }
    Ok(segments)
}

/// Expectations directory for a context root.
pub fn expectations_dir(root: &Path) -> PathBuf {
    root.join(EXPECTATIONS_DIR)
}

/// File that persists the suite called `name`.
pub fn suite_path(root: &Path, name: &str) -> Result<PathBuf> {
    let segments = name_segments(name)?;
    let mut path = expectations_dir(root);
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| SuiteError::InvalidName {
            name: name.to_string(),
            message: "name is empty".to_string(),
        })?;
    for segment in parents {
        path.push(segment);
    }
    path.push(format!("{last}.{SUITE_EXTENSION}"));
    Ok(path)
}

/// Inverse of [`suite_path`] for files found under the expectations directory.
pub fn name_from_path(expectations: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(expectations).ok()?;
    if relative.extension()?.to_str()? != SUITE_EXTENSION {
        return None;
    }
    let stem = relative.with_extension("");
    let parts: Option<Vec<&str>> = stem.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("."))
}
