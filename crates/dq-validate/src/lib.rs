//! Built-in validation backend.
//!
//! [`FileDataContext`] implements [`DataContext`] over a directory: suites
//! come from `expectations/`, named checkpoints from `checkpoints/`, results
//! and evaluation parameters go to the stores configured in `context.toml`,
//! and the docs site is rebuilt after each checkpoint that asks for it.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod run_name;

pub use config::{CONTEXT_FILE, ContextConfig, DEFAULT_RUNTIME_DATASOURCE, DatasourceConfig};
pub use context::{CHECKPOINTS_DIR, DataContext, FileDataContext, RuntimeBatches, load_context};
pub use engine::{ExpectationEngine, conforms};
pub use error::{CheckpointError, Result};
pub use run_name::render_run_name;
