use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named, persisted collection of expectations.
///
/// The serialized shape follows the usual `expectation_suite_name` /
/// `expectations` JSON layout so existing suite files load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSuite {
    pub expectation_suite_name: String,
    #[serde(default)]
    pub expectations: Vec<ExpectationConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_asset_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl ExpectationSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            expectation_suite_name: name.into(),
            expectations: Vec::new(),
            data_asset_type: None,
            meta: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.expectation_suite_name
    }

    pub fn with_expectation(mut self, expectation: ExpectationConfiguration) -> Self {
        self.expectations.push(expectation);
        self
    }
}

/// One declarative constraint as authored: a type name plus free-form kwargs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationConfiguration {
    pub expectation_type: String,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl ExpectationConfiguration {
    pub fn new(expectation_type: impl Into<String>) -> Self {
        Self {
            expectation_type: expectation_type.into(),
            kwargs: Map::new(),
            meta: Map::new(),
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// The `column` kwarg, if this is a column-level expectation.
    pub fn column(&self) -> Option<&str> {
        self.kwargs.get("column").and_then(Value::as_str)
    }
}
