//! Persisted expectation suites.
//!
//! Suites are JSON files under `<context root>/expectations`, addressed by a
//! dotted name. Resolution is exact: the stored `expectation_suite_name` has
//! to equal the requested name.

#![deny(unsafe_code)]

pub mod convert;
pub mod error;
pub mod paths;
pub mod store;

pub use convert::{Conversion, convert_yaml, read_suite_file, read_suite_yaml};
pub use error::{Result, SuiteError};
pub use paths::{EXPECTATIONS_DIR, suite_path};
pub use store::{SaveOutcome, SuiteStore, read_suite_json, write_suite_json};

use std::path::Path;

use dq_model::ExpectationSuite;

/// Load the suite called `name` from a context root.
pub fn load_suite(root: &Path, name: &str) -> Result<ExpectationSuite> {
    SuiteStore::new(root).get(name)
}

/// Sorted names of all suites under a context root.
pub fn list_suites(root: &Path) -> Result<Vec<String>> {
    SuiteStore::new(root).list()
}

/// Persist a suite at its name-derived path.
pub fn add_or_update(
    root: &Path,
    suite: &ExpectationSuite,
) -> Result<(std::path::PathBuf, SaveOutcome)> {
    SuiteStore::new(root).add_or_update(suite)
}
