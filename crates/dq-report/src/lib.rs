//! Persisted outputs of a validation run: result and evaluation-parameter
//! stores, the HTML data docs site and the status file.

pub mod docs;
pub mod error;
pub mod key;
pub mod status;
pub mod stores;

pub use docs::{DataDocsSite, INDEX_FILE};
pub use error::{ReportError, Result};
pub use key::{ResultKey, path_segment};
pub use status::{read_status_file, write_status_file};
pub use stores::{EvaluationParameterStore, EvaluationParameters, ValidationsStore};
