//! `context.toml`: datasources, store directories and the docs site.
//!
//! ```toml
//! [stores]
//! validations_dir = "uncommitted/validations"
//! evaluation_parameters_dir = "uncommitted/evaluation_parameters"
//!
//! [data_docs]
//! site_dir = "uncommitted/data_docs/local_site"
//!
//! [datasources.runtime_datasource]
//! kind = "runtime"
//!
//! [datasources.salary_files]
//! kind = "filesystem"
//! base_directory = "../data"
//! ```
//!
//! Relative paths resolve against the context root. Omitted sections take
//! the defaults shown above; without a `[datasources]` table the context has
//! the single runtime datasource `runtime_datasource`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dq_model::{INFERRED_DATA_CONNECTOR, RUNTIME_DATA_CONNECTOR};
use serde::{Deserialize, Serialize};

use crate::error::{CheckpointError, Result};

pub const CONTEXT_FILE: &str = "context.toml";
pub const DEFAULT_RUNTIME_DATASOURCE: &str = "runtime_datasource";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasourceConfig {
    /// Tables handed over in memory by the caller.
    Runtime {
        #[serde(default = "default_runtime_connector")]
        data_connector: String,
    },
    /// CSV files under a directory; the asset name is the file stem.
    Filesystem {
        base_directory: PathBuf,
        #[serde(default = "default_delimiter")]
        delimiter: char,
    },
}

fn default_runtime_connector() -> String {
    RUNTIME_DATA_CONNECTOR.to_string()
}

fn default_delimiter() -> char {
    ','
}

impl DatasourceConfig {
    pub fn runtime() -> Self {
        Self::Runtime {
            data_connector: default_runtime_connector(),
        }
    }

    /// Name of the only data connector this datasource accepts.
    pub fn data_connector(&self) -> &str {
        match self {
            Self::Runtime { data_connector } => data_connector,
            Self::Filesystem { .. } => INFERRED_DATA_CONNECTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoresConfig {
    pub validations_dir: PathBuf,
    pub evaluation_parameters_dir: PathBuf,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            validations_dir: PathBuf::from("uncommitted/validations"),
            evaluation_parameters_dir: PathBuf::from("uncommitted/evaluation_parameters"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataDocsConfig {
    pub site_dir: PathBuf,
}

impl Default for DataDocsConfig {
    fn default() -> Self {
        Self {
            site_dir: PathBuf::from("uncommitted/data_docs/local_site"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub stores: StoresConfig,
    pub data_docs: DataDocsConfig,
    pub datasources: BTreeMap<String, DatasourceConfig>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        let mut datasources = BTreeMap::new();
        datasources.insert(
            DEFAULT_RUNTIME_DATASOURCE.to_string(),
            DatasourceConfig::runtime(),
        );
        Self {
            stores: StoresConfig::default(),
            data_docs: DataDocsConfig::default(),
            datasources,
        }
    }
}

impl ContextConfig {
    /// Read `<root>/context.toml`, or the defaults when it does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONTEXT_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| CheckpointError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolve a possibly relative configured path against the context root.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
