use anyhow::{Context, Result};
use comfy_table::Table;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use tracing::{error, info, info_span};

use dq_cli::config::RunConfig;
use dq_cli::error::RunError;
use dq_cli::pipeline::{record_status, run_pipeline};
use dq_model::RunStatus;
use dq_report::write_status_file;
use dq_suite::{SuiteStore, convert_yaml, read_suite_file};
use dq_validate::{DataContext, load_context};

use crate::cli::{CheckpointArgs, ContextArgs, ConvertArgs, RegisterArgs, RunArgs};
use crate::summary::{print_checkpoint, print_summary, status_line};

/// Run the configured pipeline; the returned code follows the status file.
pub fn run(args: &RunArgs) -> i32 {
    let mut config = match RunConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let fallback = args
                .status_file
                .clone()
                .unwrap_or_else(|| RunConfig::default().report.status_file);
            let result = Err(RunError::from(err));
            report_error(&result);
            return record_status(&fallback, &result).exit_code();
        }
    };
    args.apply(&mut config);

    let result = run_pipeline(&config);
    let status = record_status(&config.report.status_file, &result);
    match &result {
        Ok(outcome) => print_summary(outcome),
        Err(_) => report_error(&result),
    }
    info!(
        status = status.as_str(),
        path = %config.report.status_file.display(),
        "status file written"
    );
    status.exit_code()
}

fn report_error<T>(result: &std::result::Result<T, RunError>) {
    if let Err(err) = result {
        eprintln!("error[{}]: {err}", err.kind());
        println!("{}", status_line(RunStatus::ScriptFailed));
    }
}

/// Run a stored checkpoint. Exit codes match `run`.
pub fn checkpoint(args: &CheckpointArgs) -> i32 {
    let span = info_span!("checkpoint_command", name = %args.name);
    let _guard = span.enter();
    let status = match run_stored_checkpoint(args) {
        Ok(status) => status,
        Err(err) => {
            error!(error = %err, "checkpoint failed");
            eprintln!("error: {err:#}");
            RunStatus::ScriptFailed
        }
    };
    if let Some(path) = &args.status_file
        && let Err(err) = write_status_file(path, status)
    {
        error!(path = %path.display(), error = %err, "failed to write status file");
    }
    status.exit_code()
}

fn run_stored_checkpoint(args: &CheckpointArgs) -> Result<RunStatus> {
    let root = &args.context.context_root;
    let context = load_context(root)
        .with_context(|| format!("open context root {}", root.display()))?;
    let result = context
        .run_named_checkpoint(&args.name)
        .with_context(|| format!("run checkpoint {}", args.name))?;
    print_checkpoint(&result);
    if let Some(index) = &result.docs_index {
        println!("Data Docs: file://{}", index.display());
    }
    let status = RunStatus::from_success(result.success);
    println!("{}", status_line(status));
    Ok(status)
}

pub fn convert(args: &ConvertArgs) -> Result<()> {
    let store = SuiteStore::new(&args.context.context_root);
    let conversion = convert_yaml(&args.yaml, &store, args.output.as_deref())
        .with_context(|| format!("convert {}", args.yaml.display()))?;
    let action = conversion
        .outcome
        .map_or("written", |outcome| outcome.as_str());
    println!(
        "Suite {} {action}: {} ({} expectations)",
        conversion.suite_name,
        conversion.destination.display(),
        conversion.expectations
    );
    Ok(())
}

pub fn register(args: &RegisterArgs) -> Result<()> {
    let suite = read_suite_file(&args.file)
        .with_context(|| format!("read suite {}", args.file.display()))?;
    let store = SuiteStore::new(&args.context.context_root);
    let (path, outcome) = store
        .add_or_update(&suite)
        .with_context(|| format!("register suite {}", suite.name()))?;
    println!(
        "Suite {} {}: {}",
        suite.name(),
        outcome.as_str(),
        path.display()
    );
    Ok(())
}

pub fn suites(args: &ContextArgs) -> Result<()> {
    let store = SuiteStore::new(&args.context_root);
    let names = store
        .list()
        .with_context(|| format!("list suites in {}", store.expectations_dir().display()))?;
    if names.is_empty() {
        println!("No suites under {}", store.expectations_dir().display());
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Suite", "Expectations"]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS);
    for name in names {
        let count = store
            .get(&name)
            .map_or_else(|_| "-".to_string(), |suite| suite.expectations.len().to_string());
        table.add_row(vec![name, count]);
    }
    println!("{table}");
    Ok(())
}

pub fn docs(args: &ContextArgs) -> Result<()> {
    let root = &args.context_root;
    let context = load_context(root)
        .with_context(|| format!("open context root {}", root.display()))?;
    let index = context.build_data_docs().context("build data docs")?;
    println!("Data Docs: {}", index.display());
    Ok(())
}
