//! The run pipeline: fetch, load, resolve, validate, report.

use std::path::{Path, PathBuf};
use std::time::Instant;

use dq_fetch::{Credentials, FetchReport, GcsConfig, GcsStore, LocalStore, ObjectLocation, ObjectStore};
use dq_ingest::{LoadOptions, load_csv};
use dq_model::{CheckpointResult, CheckpointValidation, RunStatus};
use dq_report::write_status_file;
use dq_validate::{DataContext, RuntimeBatches, load_context};
use tracing::{debug, error, info, info_span, warn};

use crate::config::{ConfigError, RunConfig, StorageBackend};
use crate::error::RunError;
use crate::logging::redact_value;

/// Everything the summary needs from a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub fetch: FetchReport,
    pub rows: usize,
    pub columns: usize,
    pub checkpoint: CheckpointResult,
    /// Absolute path of the docs index, when it exists.
    pub docs_index: Option<PathBuf>,
    /// Where the docs index was expected.
    pub expected_docs_index: PathBuf,
}

/// Object store selected by `[storage]`.
pub fn build_store(config: &RunConfig) -> Result<Box<dyn ObjectStore>, RunError> {
    match config.storage.backend {
        StorageBackend::Gcs => {
            let store = GcsStore::new(GcsConfig {
                endpoint: config.storage.endpoint.clone(),
                user_project: config
                    .storage
                    .requester_pays
                    .then(|| config.source.project_id.clone())
                    .flatten(),
                credentials: Credentials::Ambient,
            })?;
            Ok(Box::new(store))
        }
        StorageBackend::Local => {
            let root = config
                .storage
                .local_root
                .clone()
                .ok_or_else(|| ConfigError::Invalid {
                    field: "storage.local_root",
                    message: "required when storage.backend = \"local\"".to_string(),
                })?;
            Ok(Box::new(LocalStore::new(root)))
        }
    }
}

pub fn run_pipeline(config: &RunConfig) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let store = build_store(config)?;
    run_with_store(config, store.as_ref())
}

/// Run every stage against an already constructed store.
pub fn run_with_store<S>(config: &RunConfig, store: &S) -> Result<RunOutcome, RunError>
where
    S: ObjectStore + ?Sized,
{
    config.validate()?;
    let started = Instant::now();
    let span = info_span!(
        "run",
        suite = %config.validation.suite,
        checkpoint = %config.validation.checkpoint_name
    );
    let _guard = span.enter();

    let location = ObjectLocation::new(&config.source.bucket, &config.source.object)?;
    info!(%location, backend = store.name(), "downloading object");
    let fetch = store.fetch(&location, &config.source.local_path)?;
    info!(
        destination = %fetch.destination.display(),
        bytes = fetch.bytes,
        sha256 = %fetch.sha256,
        "object downloaded"
    );

    let options = LoadOptions {
        delimiter: config.delimiter(),
        ..LoadOptions::default()
    };
    let table = load_csv(&fetch.destination, &options)?;
    let rows = table.row_count();
    let columns = table.column_names().len();

    let context = load_context(&config.validation.context_root)?;
    // Resolve up front so a bad suite name fails before the checkpoint exists.
    let suite = context.get_suite(&config.validation.suite)?;
    debug!(
        suite = suite.name(),
        expectations = suite.expectations.len(),
        "suite loaded"
    );

    let checkpoint = config.checkpoint()?;
    let validation = CheckpointValidation {
        batch_request: config.batch_request(),
        expectation_suite_name: config.validation.suite.clone(),
        action_list: Vec::new(),
    };
    let mut batches = RuntimeBatches::new();
    batches.insert(config.validation.data_asset_name.clone(), table);

    let result = context.run_checkpoint(&checkpoint, &[validation], &batches)?;
    log_failures(&result);

    let expected_docs_index = context.docs_index_path();
    let docs_index = absolute_if_exists(&expected_docs_index);
    if docs_index.is_none() {
        warn!(path = %expected_docs_index.display(), "data docs index not found");
    }

    let status = RunStatus::from_success(result.success);
    info!(
        status = status.as_str(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "run finished"
    );
    Ok(RunOutcome {
        status,
        fetch,
        rows,
        columns,
        checkpoint: result,
        docs_index,
        expected_docs_index,
    })
}

fn log_failures(result: &CheckpointResult) {
    for validation in &result.validation_results {
        for failure in validation.failures() {
            let sample = failure.result.partial_unexpected_list.join(", ");
            debug!(
                expectation = %failure.expectation_config.expectation_type,
                column = failure.column().unwrap_or("-"),
                unexpected = failure.result.unexpected_count,
                sample = redact_value(&sample),
                "expectation failed"
            );
        }
    }
}

fn absolute_if_exists(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        return None;
    }
    std::path::absolute(path).ok().or_else(|| Some(path.to_path_buf()))
}

/// Map a run result to its status and record it in the status file.
///
/// The status file is written whatever the outcome; failing to write it is
/// logged and does not change the status.
pub fn record_status(status_file: &Path, result: &Result<RunOutcome, RunError>) -> RunStatus {
    let status = match result {
        Ok(outcome) => outcome.status,
        Err(err) => {
            error!(kind = err.kind(), error = %err, "run failed");
            RunStatus::ScriptFailed
        }
    };
    if let Err(err) = write_status_file(status_file, status) {
        error!(path = %status_file.display(), error = %err, "failed to write status file");
    }
    status
}
