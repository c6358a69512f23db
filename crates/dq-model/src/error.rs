use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("unsupported expectation type: {0}")]
    UnsupportedExpectation(String),

    #[error("invalid kwargs for {expectation_type}: {message}")]
    InvalidKwargs {
        expectation_type: String,
        message: String,
    },

    #[error("unknown column type: {0}")]
    UnknownValueType(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("duplicate action name in action list: {name}")]
    DuplicateAction { name: String },
}

impl ModelError {
    pub(crate) fn kwargs(expectation_type: &str, message: impl Into<String>) -> Self {
        Self::InvalidKwargs {
            expectation_type: expectation_type.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
