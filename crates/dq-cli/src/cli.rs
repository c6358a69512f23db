//! CLI argument definitions for `dq`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use dq_cli::config::{RunConfig, StorageBackend};

#[derive(Parser)]
#[command(
    name = "dq",
    version,
    about = "Fetch a CSV from object storage and gate it on an expectation suite",
    long_about = "Download one CSV object, validate it against a stored expectation suite,\n\
                  record the results and data docs, and write a status file.\n\n\
                  Exit codes: 0 validation passed, 1 validation failed, 2 run failed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include sampled cell values in log events.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download the configured object and validate it.
    Run(RunArgs),

    /// Run a checkpoint stored under `checkpoints/` in the context root.
    Checkpoint(CheckpointArgs),

    /// Convert a YAML suite to JSON and register it.
    Convert(ConvertArgs),

    /// Register a JSON or YAML suite file under its own name.
    Register(RegisterArgs),

    /// List the suites stored in the context root.
    Suites(ContextArgs),

    /// Rebuild the data docs site from the stored validation results.
    Docs(ContextArgs),
}

#[derive(Args)]
pub struct ContextArgs {
    /// Context root holding `expectations/`, `checkpoints/` and `context.toml`.
    #[arg(long = "context-root", value_name = "DIR", default_value = "great_expectations")]
    pub context_root: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    /// Run configuration (default: ./dq.toml when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long = "bucket")]
    pub bucket: Option<String>,

    /// Object name inside the bucket.
    #[arg(long = "object")]
    pub object: Option<String>,

    /// Project owning the bucket.
    #[arg(long = "project-id")]
    pub project_id: Option<String>,

    /// Where the downloaded CSV is written.
    #[arg(long = "local-path", value_name = "PATH")]
    pub local_path: Option<PathBuf>,

    #[arg(long = "backend", value_enum)]
    pub backend: Option<BackendArg>,

    /// Directory of buckets for the local backend.
    #[arg(long = "local-root", value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Storage API endpoint override.
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Bill requests to `--project-id` (requester-pays buckets).
    #[arg(long = "requester-pays")]
    pub requester_pays: bool,

    #[arg(long = "context-root", value_name = "DIR")]
    pub context_root: Option<PathBuf>,

    /// Dotted suite name, e.g. `surveys.developer_salaries.csv_schema_warning`.
    #[arg(long = "suite")]
    pub suite: Option<String>,

    #[arg(long = "datasource")]
    pub datasource: Option<String>,

    /// Data asset name used for the runtime batch.
    #[arg(long = "asset")]
    pub asset: Option<String>,

    #[arg(long = "checkpoint-name")]
    pub checkpoint_name: Option<String>,

    /// Explicit run name instead of the strftime template.
    #[arg(long = "run-name")]
    pub run_name: Option<String>,

    #[arg(long = "status-file", value_name = "PATH")]
    pub status_file: Option<PathBuf>,
}

impl RunArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(value) = &self.bucket {
            config.source.bucket.clone_from(value);
        }
        if let Some(value) = &self.object {
            config.source.object.clone_from(value);
        }
        if let Some(value) = &self.project_id {
            config.source.project_id = Some(value.clone());
        }
        if let Some(value) = &self.local_path {
            config.source.local_path.clone_from(value);
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend.into();
        }
        if let Some(value) = &self.local_root {
            config.storage.local_root = Some(value.clone());
        }
        if let Some(value) = &self.endpoint {
            config.storage.endpoint = Some(value.clone());
        }
        if self.requester_pays {
            config.storage.requester_pays = true;
        }
        if let Some(value) = &self.context_root {
            config.validation.context_root.clone_from(value);
        }
        if let Some(value) = &self.suite {
            config.validation.suite.clone_from(value);
        }
        if let Some(value) = &self.datasource {
            config.validation.datasource.clone_from(value);
        }
        if let Some(value) = &self.asset {
            config.validation.data_asset_name.clone_from(value);
        }
        if let Some(value) = &self.checkpoint_name {
            config.validation.checkpoint_name.clone_from(value);
        }
        if let Some(value) = &self.run_name {
            config.validation.run_name = Some(value.clone());
        }
        if let Some(value) = &self.status_file {
            config.report.status_file.clone_from(value);
        }
    }
}

#[derive(Args)]
pub struct CheckpointArgs {
    /// Checkpoint name; read from `checkpoints/<NAME>.toml`.
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Status file to write (not written when omitted).
    #[arg(long = "status-file", value_name = "PATH")]
    pub status_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// YAML suite to convert.
    #[arg(value_name = "YAML")]
    pub yaml: PathBuf,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Write the JSON here instead of the suite's canonical path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Suite file (`.json`, `.yaml` or `.yml`).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Gcs,
    Local,
}

impl From<BackendArg> for StorageBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Gcs => Self::Gcs,
            BackendArg::Local => Self::Local,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
