//! `dq.toml`: the run configuration.
//!
//! Every field has a default, so an absent file or section means "use the
//! defaults". Command-line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use dq_model::{ActionConfig, BatchRequest, CheckpointConfig, DEFAULT_RUN_NAME_TEMPLATE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dq.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Gcs,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub bucket: String,
    pub object: String,
    /// Project owning the bucket; billed only when `storage.requester_pays` is set.
    pub project_id: Option<String>,
    pub local_path: PathBuf,
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bucket: "software-developer-salaries-upload".to_string(),
            object: "surveys/developer_salaries/ai-jobsnet_salaries_2024.csv".to_string(),
            project_id: Some("software-developer-salaries".to_string()),
            local_path: PathBuf::from("/tmp/developer_salaries.csv"),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding one sub-directory per bucket (`local` backend).
    pub local_root: Option<PathBuf>,
    /// Storage API endpoint override, e.g. an emulator.
    pub endpoint: Option<String>,
    /// Send `source.project_id` as the billing project on every request.
    pub requester_pays: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub context_root: PathBuf,
    pub suite: String,
    pub datasource: String,
    pub data_asset_name: String,
    pub checkpoint_name: String,
    pub run_name_template: String,
    pub run_name: Option<String>,
    pub actions: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            context_root: PathBuf::from("great_expectations"),
            suite: "surveys.developer_salaries.csv_schema_warning".to_string(),
            datasource: dq_validate::DEFAULT_RUNTIME_DATASOURCE.to_string(),
            data_asset_name: "developer_salaries_csv".to_string(),
            checkpoint_name: "csv_schema_checkpoint_runtime".to_string(),
            run_name_template: DEFAULT_RUN_NAME_TEMPLATE.to_string(),
            run_name: None,
            actions: ActionConfig::default_list()
                .into_iter()
                .map(|action| action.name)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub status_file: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            status_file: PathBuf::from("gx_status.txt"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub validation: ValidationConfig,
    pub report: ReportConfig,
}

impl RunConfig {
    /// Load an explicit config file, or `dq.toml` if present, or the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let require = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                Err(ConfigError::Invalid {
                    field,
                    message: "must not be empty".to_string(),
                })
            } else {
                Ok(())
            }
        };
        require("source.bucket", &self.source.bucket)?;
        require("source.object", &self.source.object)?;
        require("validation.suite", &self.validation.suite)?;
        require("validation.datasource", &self.validation.datasource)?;
        require("validation.data_asset_name", &self.validation.data_asset_name)?;
        require("validation.checkpoint_name", &self.validation.checkpoint_name)?;
        if !self.source.delimiter.is_ascii() {
            return Err(ConfigError::Invalid {
                field: "source.delimiter",
                message: format!("{:?} is not a single-byte character", self.source.delimiter),
            });
        }
        if self.storage.requester_pays && self.source.project_id.is_none() {
            return Err(ConfigError::Invalid {
                field: "source.project_id",
                message: "required when storage.requester_pays = true".to_string(),
            });
        }
        if self.storage.backend == StorageBackend::Local && self.storage.local_root.is_none() {
            return Err(ConfigError::Invalid {
                field: "storage.local_root",
                message: "required when storage.backend = \"local\"".to_string(),
            });
        }
        Ok(())
    }

    /// Field separator as a byte; non-ASCII values are rejected by [`Self::validate`].
    pub fn delimiter(&self) -> u8 {
        u8::try_from(self.source.delimiter).unwrap_or(b',')
    }

    pub fn actions(&self) -> Result<Vec<ActionConfig>, dq_model::ModelError> {
        self.validation
            .actions
            .iter()
            .map(|name| ActionConfig::from_short_name(name))
            .collect()
    }

    /// The runtime checkpoint this config describes, without validations.
    pub fn checkpoint(&self) -> Result<CheckpointConfig, dq_model::ModelError> {
        let mut checkpoint = CheckpointConfig::new(&self.validation.checkpoint_name);
        checkpoint.run_name_template = self.validation.run_name_template.clone();
        checkpoint.run_name = self.validation.run_name.clone();
        checkpoint.action_list = self.actions()?;
        Ok(checkpoint)
    }

    pub fn batch_request(&self) -> BatchRequest {
        BatchRequest::runtime(&self.validation.datasource, &self.validation.data_asset_name)
    }
}
