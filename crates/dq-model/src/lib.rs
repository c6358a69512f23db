pub mod checkpoint;
pub mod error;
pub mod expectation;
pub mod result;
pub mod status;
pub mod suite;

pub use checkpoint::{
    ActionConfig, ActionKind, BatchRequest, CheckpointConfig, CheckpointValidation,
    DEFAULT_RUN_NAME_TEMPLATE, INFERRED_DATA_CONNECTOR, RUNTIME_DATA_CONNECTOR,
    merge_action_lists,
};
pub use error::{ModelError, Result};
pub use expectation::{Expectation, ValueType};
pub use result::{
    CheckpointResult, ExceptionInfo, ExpectationOutcome, ExpectationValidationResult,
    PARTIAL_UNEXPECTED_LIMIT, RunIdentifier, ValidationResult, ValidationStatistics,
};
pub use status::RunStatus;
pub use suite::{ExpectationConfiguration, ExpectationSuite};
