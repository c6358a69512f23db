//! The data context: suites, datasources, checkpoints and their actions.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use dq_ingest::{LoadOptions, LocalTable, load_csv};
use dq_model::{
    ActionConfig, ActionKind, BatchRequest, CheckpointConfig, CheckpointResult,
    CheckpointValidation, ExpectationSuite, RunIdentifier, ValidationResult, merge_action_lists,
};
use dq_report::{DataDocsSite, EvaluationParameterStore, ValidationsStore};
use dq_suite::SuiteStore;
use tracing::{info, info_span, warn};

use crate::config::{ContextConfig, DatasourceConfig, resolve};
use crate::engine::ExpectationEngine;
use crate::error::{CheckpointError, Result};
use crate::run_name::render_run_name;

pub const CHECKPOINTS_DIR: &str = "checkpoints";

/// In-memory tables for runtime batch requests, keyed by data asset name.
pub type RuntimeBatches = BTreeMap<String, LocalTable>;

/// Capability surface the pipeline needs from a validation backend.
pub trait DataContext {
    fn root(&self) -> &Path;

    fn get_suite(&self, name: &str) -> Result<ExpectationSuite>;

    /// Run `checkpoint` plus any extra `validations`.
    fn run_checkpoint(
        &self,
        checkpoint: &CheckpointConfig,
        validations: &[CheckpointValidation],
        batches: &RuntimeBatches,
    ) -> Result<CheckpointResult>;

    /// Rebuild the docs site from stored results. Returns the index path.
    fn build_data_docs(&self) -> Result<PathBuf>;

    fn docs_index_path(&self) -> PathBuf;
}

/// A data context backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FileDataContext {
    root: PathBuf,
    config: ContextConfig,
    suites: SuiteStore,
    validations: ValidationsStore,
    evaluation_parameters: EvaluationParameterStore,
    docs: DataDocsSite,
}

/// Open the data context rooted at `root`.
pub fn load_context(root: &Path) -> Result<FileDataContext> {
    FileDataContext::open(root)
}

/// A validation that passed every pre-flight check.
struct PreparedValidation<'a> {
    validation: &'a CheckpointValidation,
    engine: ExpectationEngine,
    actions: Vec<ActionConfig>,
    table: Cow<'a, LocalTable>,
}

impl FileDataContext {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(CheckpointError::MissingContextRoot {
                root: root.to_path_buf(),
            });
        }
        let config = ContextConfig::load(root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: &Path, config: ContextConfig) -> Self {
        let validations = ValidationsStore::new(resolve(root, &config.stores.validations_dir));
        let evaluation_parameters =
            EvaluationParameterStore::new(resolve(root, &config.stores.evaluation_parameters_dir));
        let docs = DataDocsSite::new(resolve(root, &config.data_docs.site_dir));
        Self {
            root: root.to_path_buf(),
            suites: SuiteStore::new(root),
            validations,
            evaluation_parameters,
            docs,
            config,
        }
    }

    pub fn validations_store(&self) -> &ValidationsStore {
        &self.validations
    }

    pub fn checkpoint_path(&self, name: &str) -> PathBuf {
        self.root
            .join(CHECKPOINTS_DIR)
            .join(format!("{}.toml", dq_report::path_segment(name)))
    }

    /// Read `checkpoints/<name>.toml`.
    pub fn load_checkpoint(&self, name: &str) -> Result<CheckpointConfig> {
        let path = self.checkpoint_path(name);
        if !path.is_file() {
            return Err(CheckpointError::CheckpointNotFound {
                name: name.to_string(),
                path,
            });
        }
        let text = fs::read_to_string(&path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        let mut checkpoint: CheckpointConfig =
            toml::from_str(&text).map_err(|source| CheckpointError::ConfigFile {
                path: path.clone(),
                source,
            })?;
        if checkpoint.name.is_empty() {
            checkpoint.name = name.to_string();
        }
        Ok(checkpoint)
    }

    /// Run a persisted checkpoint; its batches come from filesystem datasources.
    pub fn run_named_checkpoint(&self, name: &str) -> Result<CheckpointResult> {
        let checkpoint = self.load_checkpoint(name)?;
        self.run_checkpoint(&checkpoint, &[], &RuntimeBatches::new())
    }

    fn datasource(&self, request: &BatchRequest) -> Result<&DatasourceConfig> {
        let datasource = self
            .config
            .datasources
            .get(&request.datasource_name)
            .ok_or_else(|| CheckpointError::UnknownDatasource {
                name: request.datasource_name.clone(),
            })?;
        if request.data_connector_name != datasource.data_connector() {
            return Err(CheckpointError::ConnectorMismatch {
                datasource: request.datasource_name.clone(),
                expected: datasource.data_connector().to_string(),
                found: request.data_connector_name.clone(),
            });
        }
        if request.data_asset_name.trim().is_empty() {
            return Err(CheckpointError::EmptyAssetName {
                datasource: request.datasource_name.clone(),
            });
        }
        Ok(datasource)
    }

    /// Check the batch request shape and locate its table.
    fn resolve_batch<'a>(
        &self,
        request: &BatchRequest,
        batches: &'a RuntimeBatches,
    ) -> Result<Cow<'a, LocalTable>> {
        match self.datasource(request)? {
            DatasourceConfig::Runtime { .. } => {
                if request.batch_identifiers.is_empty() {
                    return Err(CheckpointError::MissingBatchIdentifiers {
                        asset: request.data_asset_name.clone(),
                    });
                }
                batches
                    .get(&request.data_asset_name)
                    .map(Cow::Borrowed)
                    .ok_or_else(|| CheckpointError::MissingRuntimeBatch {
                        asset: request.data_asset_name.clone(),
                    })
            }
            DatasourceConfig::Filesystem {
                base_directory,
                delimiter,
            } => {
                let base = resolve(&self.root, base_directory);
                let path = asset_file(&base, &request.data_asset_name).ok_or_else(|| {
                    CheckpointError::AssetNotFound {
                        asset: request.data_asset_name.clone(),
                        base: base.clone(),
                    }
                })?;
                let delimiter = u8::try_from(*delimiter)
                    .ok()
                    .filter(u8::is_ascii)
                    .ok_or_else(|| CheckpointError::InvalidDelimiter {
                        datasource: request.datasource_name.clone(),
                        delimiter: *delimiter,
                    })?;
                let options = LoadOptions {
                    delimiter,
                    ..LoadOptions::default()
                };
                Ok(Cow::Owned(load_csv(&path, &options)?))
            }
        }
    }

    fn prepare<'a>(
        &self,
        checkpoint: &CheckpointConfig,
        validation: &'a CheckpointValidation,
        batches: &'a RuntimeBatches,
    ) -> Result<PreparedValidation<'a>> {
        let actions = merge_action_lists(&checkpoint.action_list, &validation.action_list)?;
        let suite = self.get_suite(&validation.expectation_suite_name)?;
        let engine = ExpectationEngine::compile(&suite)?;
        let table = self.resolve_batch(&validation.batch_request, batches)?;
        Ok(PreparedValidation {
            validation,
            engine,
            actions,
            table,
        })
    }

    fn run_actions(
        &self,
        actions: &[ActionConfig],
        result: &ValidationResult,
        update_docs: &mut bool,
    ) -> Result<()> {
        for action in actions {
            match action.action {
                ActionKind::StoreValidationResultAction => {
                    self.validations.store(result)?;
                }
                ActionKind::StoreEvaluationParametersAction => {
                    self.evaluation_parameters.store(result)?;
                }
                ActionKind::UpdateDataDocsAction => *update_docs = true,
            }
        }
        Ok(())
    }

    fn rebuild_docs(&self, current: &[ValidationResult]) -> Result<PathBuf> {
        let mut results = self.validations.load_all()?;
        for result in current {
            let stored = results.iter().any(|existing| {
                existing.run_id == result.run_id
                    && existing.expectation_suite_name == result.expectation_suite_name
                    && existing.batch_id == result.batch_id
            });
            if !stored {
                results.push(result.clone());
            }
        }
        Ok(self.docs.build(&results)?)
    }
}

/// `<base>/<asset>` if it is a file, else `<base>/<asset>.csv`.
fn asset_file(base: &Path, asset: &str) -> Option<PathBuf> {
    let exact = base.join(asset);
    if exact.is_file() {
        return Some(exact);
    }
    let with_extension = base.join(format!("{asset}.csv"));
    with_extension.is_file().then_some(with_extension)
}

impl DataContext for FileDataContext {
    fn root(&self) -> &Path {
        &self.root
    }

    fn get_suite(&self, name: &str) -> Result<ExpectationSuite> {
        Ok(self.suites.get(name)?)
    }

    fn run_checkpoint(
        &self,
        checkpoint: &CheckpointConfig,
        validations: &[CheckpointValidation],
        batches: &RuntimeBatches,
    ) -> Result<CheckpointResult> {
        let span = info_span!("checkpoint", name = %checkpoint.name);
        let _guard = span.enter();

        let all: Vec<&CheckpointValidation> =
            checkpoint.validations.iter().chain(validations).collect();
        if all.is_empty() {
            return Err(CheckpointError::NoValidations {
                name: checkpoint.name.clone(),
            });
        }

        // Everything is checked before the first expectation runs.
        let prepared = all
            .into_iter()
            .map(|validation| self.prepare(checkpoint, validation, batches))
            .collect::<Result<Vec<_>>>()?;

        let run_time = Utc::now();
        let run_name = match &checkpoint.run_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => render_run_name(&checkpoint.run_name_template, run_time)?,
        };
        let run_id = RunIdentifier::new(run_name, run_time);
        info!(run_name = %run_id.run_name, validations = prepared.len(), "checkpoint started");

        let mut results = Vec::with_capacity(prepared.len());
        let mut update_docs = false;
        for item in &prepared {
            let request = &item.validation.batch_request;
            let outcomes = item.engine.evaluate(&item.table);
            let result = ValidationResult::new(
                item.engine.suite_name(),
                run_id.clone(),
                request.batch_id(),
                request.data_asset_name.clone(),
                outcomes,
            );
            info!(
                suite = item.engine.suite_name(),
                asset = %request.data_asset_name,
                success = result.success,
                evaluated = result.statistics.evaluated_expectations,
                unsuccessful = result.statistics.unsuccessful_expectations,
                "validation finished"
            );
            self.run_actions(&item.actions, &result, &mut update_docs)?;
            results.push(result);
        }

        let mut checkpoint_result =
            CheckpointResult::new(checkpoint.name.clone(), run_id, results);
        if update_docs {
            checkpoint_result.docs_index =
                Some(self.rebuild_docs(&checkpoint_result.validation_results)?);
        } else if prepared.iter().all(|item| item.actions.is_empty()) {
            warn!("checkpoint has no actions; nothing was persisted");
        }
        info!(success = checkpoint_result.success, "checkpoint finished");
        Ok(checkpoint_result)
    }

    fn build_data_docs(&self) -> Result<PathBuf> {
        self.rebuild_docs(&[])
    }

    fn docs_index_path(&self) -> PathBuf {
        self.docs.index_path()
    }
}
