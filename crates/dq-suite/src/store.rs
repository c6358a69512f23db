use std::fs;
use std::path::{Path, PathBuf};

use dq_model::ExpectationSuite;
use tracing::{debug, info, warn};

use crate::error::{Result, SuiteError};
use crate::paths::{self, SUITE_EXTENSION};

/// Whether [`SuiteStore::add_or_update`] wrote a new file or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

impl SaveOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Filesystem suite store rooted at a context directory.
#[derive(Debug, Clone)]
pub struct SuiteStore {
    root: PathBuf,
}

impl SuiteStore {
    pub fn new(context_root: impl Into<PathBuf>) -> Self {
        Self {
            root: context_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn expectations_dir(&self) -> PathBuf {
        paths::expectations_dir(&self.root)
    }

    /// Resolve a suite by its exact name.
    ///
    /// The name must map to an existing file and the file's
    /// `expectation_suite_name` must equal `name` byte for byte.
    pub fn get(&self, name: &str) -> Result<ExpectationSuite> {
        let not_found = || SuiteError::NotFound {
            name: name.to_string(),
            root: self.root.clone(),
        };
        let path = match paths::suite_path(&self.root, name) {
            Ok(path) => path,
            Err(err) => {
                debug!(suite = name, error = %err, "suite name cannot be resolved");
                return Err(not_found());
            }
        };
        if !path.is_file() {
            debug!(suite = name, path = %path.display(), "suite file missing");
            return Err(not_found());
        }

        let suite = read_suite_json(&path)?;
        if suite.name() != name {
            warn!(
                suite = name,
                stored_name = suite.name(),
                path = %path.display(),
                "suite file declares a different name"
            );
            return Err(not_found());
        }
        debug!(
            suite = name,
            expectations = suite.expectations.len(),
            "suite resolved"
        );
        Ok(suite)
    }

    /// Names of every resolvable suite, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let base = self.expectations_dir();
        let mut files = Vec::new();
        if base.is_dir() {
            collect_suite_files(&base, &mut files)?;
        }
        let mut names = Vec::with_capacity(files.len());
        for file in files {
            let Some(expected) = paths::name_from_path(&base, &file) else {
                continue;
            };
            match read_suite_json(&file) {
                Ok(suite) if suite.name() == expected => names.push(expected),
                Ok(suite) => warn!(
                    path = %file.display(),
                    stored_name = suite.name(),
                    "skipping suite whose name does not match its location"
                ),
                Err(err) => warn!(path = %file.display(), error = %err, "skipping unreadable suite"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Persist a suite at the path derived from its name.
    pub fn add_or_update(&self, suite: &ExpectationSuite) -> Result<(PathBuf, SaveOutcome)> {
        let path = paths::suite_path(&self.root, suite.name())?;
        let outcome = if path.exists() {
            SaveOutcome::Updated
        } else {
            SaveOutcome::Created
        };
        write_suite_json(&path, suite)?;
        info!(
            suite = suite.name(),
            path = %path.display(),
            outcome = outcome.as_str(),
            "suite saved"
        );
        Ok((path, outcome))
    }
}

/// Read a suite JSON file without any name check.
pub fn read_suite_json(path: &Path) -> Result<ExpectationSuite> {
    let text = fs::read_to_string(path).map_err(|e| SuiteError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| SuiteError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a suite as pretty JSON, creating parent directories.
pub fn write_suite_json(path: &Path, suite: &ExpectationSuite) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SuiteError::io(parent, e))?;
    }
    let mut text = serde_json::to_string_pretty(suite).map_err(|source| SuiteError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    fs::write(path, text).map_err(|e| SuiteError::io(path, e))
}

fn collect_suite_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| SuiteError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SuiteError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_suite_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SUITE_EXTENSION))
        {
            out.push(path);
        }
    }
    Ok(())
}
