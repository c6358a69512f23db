//! Typed expectations.
//!
//! Suites are authored as loose `expectation_type` + `kwargs` pairs. Before a
//! checkpoint evaluates anything, every configuration is parsed into an
//! [`Expectation`] so that unknown types and malformed kwargs surface as a
//! configuration error instead of a half-evaluated run.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::suite::ExpectationConfiguration;

/// Column value types understood by the type expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Float,
    String,
    Boolean,
}

impl ValueType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Float => "float",
            Self::String => "str",
            Self::Boolean => "bool",
        }
    }
}

impl FromStr for ValueType {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "int" | "int32" | "int64" | "integer" | "long" => Ok(Self::Integer),
            "float" | "float32" | "float64" | "double" | "number" | "numeric" => Ok(Self::Float),
            "str" | "string" | "object" | "text" => Ok(Self::String),
            "bool" | "boolean" => Ok(Self::Boolean),
            _ => Err(ModelError::UnknownValueType(raw.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    TableColumnsMatchOrderedList {
        columns: Vec<String>,
    },
    TableColumnsMatchSet {
        columns: Vec<String>,
        exact_match: bool,
    },
    TableColumnCountEqual {
        value: usize,
    },
    TableRowCountBetween {
        min: Option<u64>,
        max: Option<u64>,
    },
    TableRowCountEqual {
        value: u64,
    },
    ColumnExists {
        column: String,
    },
    ColumnValuesNotNull {
        column: String,
        mostly: f64,
    },
    ColumnValuesNull {
        column: String,
        mostly: f64,
    },
    ColumnValuesOfType {
        column: String,
        value_type: ValueType,
        mostly: f64,
    },
    ColumnValuesInTypeList {
        column: String,
        types: Vec<ValueType>,
        mostly: f64,
    },
    ColumnValuesBetween {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
        strict_min: bool,
        strict_max: bool,
        mostly: f64,
    },
    ColumnValuesInSet {
        column: String,
        values: Vec<String>,
        mostly: f64,
    },
    ColumnValuesMatchRegex {
        column: String,
        pattern: String,
        mostly: f64,
    },
    ColumnValuesUnique {
        column: String,
        mostly: f64,
    },
    ColumnValueLengthsBetween {
        column: String,
        min: Option<usize>,
        max: Option<usize>,
        mostly: f64,
    },
}

impl Expectation {
    /// Parse an authored configuration into its typed form.
    pub fn from_config(config: &ExpectationConfiguration) -> Result<Self> {
        let kwargs = Kwargs::new(&config.expectation_type, &config.kwargs);
        let expectation = match config.expectation_type.as_str() {
            "expect_table_columns_to_match_ordered_list" => Self::TableColumnsMatchOrderedList {
                columns: kwargs.string_list("column_list")?,
            },
            "expect_table_columns_to_match_set" => Self::TableColumnsMatchSet {
                columns: kwargs.string_list("column_set")?,
                exact_match: kwargs.optional_bool("exact_match")?.unwrap_or(true),
            },
            "expect_table_column_count_to_equal" => Self::TableColumnCountEqual {
                value: kwargs.required_u64("value")? as usize,
            },
            "expect_table_row_count_to_be_between" => {
                let min = kwargs.optional_u64("min_value")?;
                let max = kwargs.optional_u64("max_value")?;
                if let (Some(min), Some(max)) = (min, max)
                    && min > max
                {
                    return Err(kwargs.error("min_value is greater than max_value"));
                }
                Self::TableRowCountBetween { min, max }
            }
            "expect_table_row_count_to_equal" => Self::TableRowCountEqual {
                value: kwargs.required_u64("value")?,
            },
            "expect_column_to_exist" => Self::ColumnExists {
                column: kwargs.required_str("column")?,
            },
            "expect_column_values_to_not_be_null" => Self::ColumnValuesNotNull {
                column: kwargs.required_str("column")?,
                mostly: kwargs.mostly()?,
            },
            "expect_column_values_to_be_null" => Self::ColumnValuesNull {
                column: kwargs.required_str("column")?,
                mostly: kwargs.mostly()?,
            },
            "expect_column_values_to_be_of_type" => {
                let raw = kwargs.required_str("type_")?;
                Self::ColumnValuesOfType {
                    column: kwargs.required_str("column")?,
                    value_type: raw.parse()?,
                    mostly: kwargs.mostly()?,
                }
            }
            "expect_column_values_to_be_in_type_list" => {
                let types = kwargs
                    .string_list("type_list")?
                    .iter()
                    .map(|raw| raw.parse())
                    .collect::<Result<Vec<ValueType>>>()?;
                if types.is_empty() {
                    return Err(kwargs.error("type_list must not be empty"));
                }
                Self::ColumnValuesInTypeList {
                    column: kwargs.required_str("column")?,
                    types,
                    mostly: kwargs.mostly()?,
                }
            }
            "expect_column_values_to_be_between" => {
                let min = kwargs.optional_f64("min_value")?;
                let max = kwargs.optional_f64("max_value")?;
                if min.is_none() && max.is_none() {
                    return Err(kwargs.error("min_value and max_value cannot both be null"));
                }
                if let (Some(min), Some(max)) = (min, max)
                    && min > max
                {
                    return Err(kwargs.error("min_value is greater than max_value"));
                }
                Self::ColumnValuesBetween {
                    column: kwargs.required_str("column")?,
                    min,
                    max,
                    strict_min: kwargs.optional_bool("strict_min")?.unwrap_or(false),
                    strict_max: kwargs.optional_bool("strict_max")?.unwrap_or(false),
                    mostly: kwargs.mostly()?,
                }
            }
            "expect_column_values_to_be_in_set" => Self::ColumnValuesInSet {
                column: kwargs.required_str("column")?,
                values: kwargs.scalar_list("value_set")?,
                mostly: kwargs.mostly()?,
            },
            "expect_column_values_to_match_regex" => Self::ColumnValuesMatchRegex {
                column: kwargs.required_str("column")?,
                pattern: kwargs.required_str("regex")?,
                mostly: kwargs.mostly()?,
            },
            "expect_column_values_to_be_unique" => Self::ColumnValuesUnique {
                column: kwargs.required_str("column")?,
                mostly: kwargs.mostly()?,
            },
            "expect_column_value_lengths_to_be_between" => {
                let min = kwargs.optional_u64("min_value")?.map(|v| v as usize);
                let max = kwargs.optional_u64("max_value")?.map(|v| v as usize);
                if min.is_none() && max.is_none() {
                    return Err(kwargs.error("min_value and max_value cannot both be null"));
                }
                Self::ColumnValueLengthsBetween {
                    column: kwargs.required_str("column")?,
                    min,
                    max,
                    mostly: kwargs.mostly()?,
                }
            }
            other => return Err(ModelError::UnsupportedExpectation(other.to_string())),
        };
        Ok(expectation)
    }

    /// The column this expectation targets, if it is column-level.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::TableColumnsMatchOrderedList { .. }
            | Self::TableColumnsMatchSet { .. }
            | Self::TableColumnCountEqual { .. }
            | Self::TableRowCountBetween { .. }
            | Self::TableRowCountEqual { .. } => None,
            Self::ColumnExists { column }
            | Self::ColumnValuesNotNull { column, .. }
            | Self::ColumnValuesNull { column, .. }
            | Self::ColumnValuesOfType { column, .. }
            | Self::ColumnValuesInTypeList { column, .. }
            | Self::ColumnValuesBetween { column, .. }
            | Self::ColumnValuesInSet { column, .. }
            | Self::ColumnValuesMatchRegex { column, .. }
            | Self::ColumnValuesUnique { column, .. }
            | Self::ColumnValueLengthsBetween { column, .. } => Some(column),
        }
    }
}

/// Typed accessors over an expectation's kwargs map.
struct Kwargs<'a> {
    expectation_type: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Kwargs<'a> {
    fn new(expectation_type: &'a str, map: &'a Map<String, Value>) -> Self {
        Self {
            expectation_type,
            map,
        }
    }

    fn error(&self, message: impl Into<String>) -> ModelError {
        ModelError::kwargs(self.expectation_type, message)
    }

    /// Missing keys and explicit nulls are treated the same.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn required_str(&self, key: &str) -> Result<String> {
        match self.get(key) {
            Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
            Some(_) => Err(self.error(format!("{key} must be a non-empty string"))),
            None => Err(self.error(format!("missing required kwarg {key}"))),
        }
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(self.error(format!("{key} must be a boolean"))),
            None => Ok(None),
        }
    }

    fn optional_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.error(format!("{key} must be a number"))),
            None => Ok(None),
        }
    }

    fn optional_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.get(key) {
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.error(format!("{key} must be a non-negative integer"))),
            None => Ok(None),
        }
    }

    fn required_u64(&self, key: &str) -> Result<u64> {
        self.optional_u64(key)?
            .ok_or_else(|| self.error(format!("missing required kwarg {key}")))
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>> {
        let Some(Value::Array(items)) = self.get(key) else {
            return Err(self.error(format!("{key} must be a list of strings")));
        };
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.error(format!("{key} must be a list of strings")))
            })
            .collect()
    }

    /// A list of scalars (strings, numbers, booleans) rendered as text.
    fn scalar_list(&self, key: &str) -> Result<Vec<String>> {
        let Some(Value::Array(items)) = self.get(key) else {
            return Err(self.error(format!("{key} must be a list")));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(value) => Ok(value.clone()),
                Value::Number(value) => Ok(value.to_string()),
                Value::Bool(value) => Ok(value.to_string()),
                _ => Err(self.error(format!("{key} may only contain scalars"))),
            })
            .collect()
    }

    fn mostly(&self) -> Result<f64> {
        let mostly = self.optional_f64("mostly")?.unwrap_or(1.0);
        if !(0.0..=1.0).contains(&mostly) {
            return Err(self.error("mostly must be between 0 and 1"));
        }
        Ok(mostly)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config(expectation_type: &str, kwargs: Value) -> ExpectationConfiguration {
        let Value::Object(map) = kwargs else {
            panic!("kwargs must be an object");
        };
        ExpectationConfiguration {
            expectation_type: expectation_type.to_string(),
            kwargs: map,
            meta: Map::new(),
        }
    }

    #[test]
    fn parses_type_expectation() {
        let parsed = Expectation::from_config(&config(
            "expect_column_values_to_be_of_type",
            json!({"column": "salary", "type_": "float64"}),
        ))
        .unwrap();
        assert_eq!(
            parsed,
            Expectation::ColumnValuesOfType {
                column: "salary".to_string(),
                value_type: ValueType::Float,
                mostly: 1.0,
            }
        );
        assert_eq!(parsed.column(), Some("salary"));
    }

    #[test]
    fn rejects_unknown_expectation_type() {
        let err = Expectation::from_config(&config("expect_magic", json!({}))).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnsupportedExpectation("expect_magic".to_string())
        );
    }

    #[test]
    fn rejects_missing_column() {
        let err = Expectation::from_config(&config(
            "expect_column_values_to_not_be_null",
            json!({"mostly": 0.5}),
        ))
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidKwargs { .. }));
    }

    #[test]
    fn rejects_mostly_out_of_range() {
        let err = Expectation::from_config(&config(
            "expect_column_values_to_be_unique",
            json!({"column": "id", "mostly": 1.5}),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("mostly"));
    }

    #[test]
    fn between_requires_a_bound() {
        let err = Expectation::from_config(&config(
            "expect_column_values_to_be_between",
            json!({"column": "year", "min_value": null, "max_value": null}),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("cannot both be null"));
    }

    #[test]
    fn value_set_accepts_mixed_scalars() {
        let parsed = Expectation::from_config(&config(
            "expect_column_values_to_be_in_set",
            json!({"column": "year", "value_set": [2023, "2024", true]}),
        ))
        .unwrap();
        let Expectation::ColumnValuesInSet { values, .. } = parsed else {
            panic!("unexpected variant");
        };
        assert_eq!(values, vec!["2023", "2024", "true"]);
    }

    #[test]
    fn value_type_aliases() {
        assert_eq!("int64".parse::<ValueType>().unwrap(), ValueType::Integer);
        assert_eq!("Number".parse::<ValueType>().unwrap(), ValueType::Float);
        assert_eq!("object".parse::<ValueType>().unwrap(), ValueType::String);
        assert!("decimal128".parse::<ValueType>().is_err());
    }
}
