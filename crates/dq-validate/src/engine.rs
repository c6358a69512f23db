//! Expectation engine for the built-in backend.
//!
//! A suite is compiled once (typed expectations, compiled regexes) and then
//! evaluated against a loaded table. Compilation is all-or-nothing so a bad
//! suite never produces a partial result.

use std::collections::{BTreeSet, HashMap};

use dq_ingest::{CellValue, LocalTable, parse_f64, parse_i64};
use dq_model::{
    ExceptionInfo, Expectation, ExpectationConfiguration, ExpectationOutcome,
    ExpectationSuite, ExpectationValidationResult, PARTIAL_UNEXPECTED_LIMIT, ValueType,
};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{CheckpointError, Result};

#[derive(Debug, Clone)]
struct CompiledExpectation {
    config: ExpectationConfiguration,
    expectation: Expectation,
    regex: Option<Regex>,
}

/// A suite whose expectations have all been parsed and checked.
#[derive(Debug, Clone)]
pub struct ExpectationEngine {
    suite_name: String,
    expectations: Vec<CompiledExpectation>,
}

impl ExpectationEngine {
    pub fn compile(suite: &ExpectationSuite) -> Result<Self> {
        let mut expectations = Vec::with_capacity(suite.expectations.len());
        for config in &suite.expectations {
            let expectation =
                Expectation::from_config(config).map_err(|source| CheckpointError::Expectation {
                    suite: suite.name().to_string(),
                    source,
                })?;
            let regex = match &expectation {
                Expectation::ColumnValuesMatchRegex { pattern, .. } => {
                    Some(Regex::new(pattern).map_err(|e| CheckpointError::InvalidRegex {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?)
                }
                _ => None,
            };
            expectations.push(CompiledExpectation {
                config: config.clone(),
                expectation,
                regex,
            });
        }
        Ok(Self {
            suite_name: suite.name().to_string(),
            expectations,
        })
    }

    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Evaluate every expectation, in suite order.
    pub fn evaluate(&self, table: &LocalTable) -> Vec<ExpectationValidationResult> {
        self.expectations
            .iter()
            .map(|compiled| {
                let result = evaluate_one(compiled, table);
                debug!(
                    expectation = %compiled.config.expectation_type,
                    column = compiled.expectation.column().unwrap_or(""),
                    success = result.success,
                    unexpected = result.result.unexpected_count,
                    "expectation evaluated"
                );
                result
            })
            .collect()
    }
}

fn finish(
    compiled: &CompiledExpectation,
    success: bool,
    result: ExpectationOutcome,
    exception_info: ExceptionInfo,
) -> ExpectationValidationResult {
    ExpectationValidationResult {
        success,
        expectation_config: compiled.config.clone(),
        result,
        exception_info,
    }
}

fn table_outcome(observed: Value) -> ExpectationOutcome {
    ExpectationOutcome {
        observed_value: Some(observed),
        ..ExpectationOutcome::default()
    }
}

fn evaluate_one(compiled: &CompiledExpectation, table: &LocalTable) -> ExpectationValidationResult {
    let ok = ExceptionInfo::default();
    match &compiled.expectation {
        Expectation::TableColumnsMatchOrderedList { columns } => {
            let actual = table.column_names();
            let success = &actual == columns;
            finish(compiled, success, table_outcome(Value::from(actual)), ok)
        }
        Expectation::TableColumnsMatchSet {
            columns,
            exact_match,
        } => {
            let actual = table.column_names();
            let actual_set: BTreeSet<&str> = actual.iter().map(String::as_str).collect();
            let expected_set: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
            let success = if *exact_match {
                actual_set == expected_set
            } else {
                expected_set.is_subset(&actual_set)
            };
            finish(compiled, success, table_outcome(Value::from(actual)), ok)
        }
        Expectation::TableColumnCountEqual { value } => {
            let count = table.column_names().len();
            finish(compiled, count == *value, table_outcome(Value::from(count)), ok)
        }
        Expectation::TableRowCountBetween { min, max } => {
            let rows = table.row_count() as u64;
            let success = min.is_none_or(|min| rows >= min) && max.is_none_or(|max| rows <= max);
            finish(compiled, success, table_outcome(Value::from(rows)), ok)
        }
        Expectation::TableRowCountEqual { value } => {
            let rows = table.row_count() as u64;
            finish(compiled, rows == *value, table_outcome(Value::from(rows)), ok)
        }
        Expectation::ColumnExists { column } => {
            let success = table.has_column(column);
            finish(compiled, success, ExpectationOutcome::default(), ok)
        }
        expectation => evaluate_column_map(compiled, expectation, table),
    }
}

/// How a column-map expectation counts unexpected cells.
enum MapKind {
    /// Missing cells are the unexpected ones.
    Missing,
    /// Present cells are the unexpected ones.
    Present,
    /// Present cells failing a per-value predicate.
    Values,
}

fn evaluate_column_map(
    compiled: &CompiledExpectation,
    expectation: &Expectation,
    table: &LocalTable,
) -> ExpectationValidationResult {
    let Some(column) = expectation.column() else {
        return finish(
            compiled,
            false,
            ExpectationOutcome::default(),
            ExceptionInfo::raised("expectation has no target column"),
        );
    };
    let Some(cells) = table.cells(column) else {
        return finish(
            compiled,
            false,
            ExpectationOutcome::default(),
            ExceptionInfo::raised(format!("column {column:?} not found in table")),
        );
    };

    let (kind, mostly) = match expectation {
        Expectation::ColumnValuesNotNull { mostly, .. } => (MapKind::Missing, *mostly),
        Expectation::ColumnValuesNull { mostly, .. } => (MapKind::Present, *mostly),
        Expectation::ColumnValuesOfType { mostly, .. }
        | Expectation::ColumnValuesInTypeList { mostly, .. }
        | Expectation::ColumnValuesBetween { mostly, .. }
        | Expectation::ColumnValuesInSet { mostly, .. }
        | Expectation::ColumnValuesMatchRegex { mostly, .. }
        | Expectation::ColumnValuesUnique { mostly, .. }
        | Expectation::ColumnValueLengthsBetween { mostly, .. } => (MapKind::Values, *mostly),
        _ => (MapKind::Values, 1.0),
    };

    let element_count = cells.len() as u64;
    let missing_count = cells.iter().filter(|cell| cell.is_missing()).count() as u64;
    let unexpected: Vec<&CellValue> = match kind {
        MapKind::Missing => cells.iter().filter(|cell| cell.is_missing()).collect(),
        MapKind::Present => cells.iter().filter(|cell| !cell.is_missing()).collect(),
        MapKind::Values => {
            let predicate = ValuePredicate::new(compiled, expectation, &cells);
            cells
                .iter()
                .filter(|cell| !cell.is_missing() && !predicate.accepts(cell))
                .collect()
        }
    };
    let unexpected_count = unexpected.len() as u64;

    // Null checks look at every row; value checks only at non-missing ones.
    let denominator = match kind {
        MapKind::Missing | MapKind::Present => element_count,
        MapKind::Values => element_count - missing_count,
    };
    let (success, unexpected_percent) = if denominator == 0 {
        (true, 0.0)
    } else {
        let expected_ratio = (denominator - unexpected_count) as f64 / denominator as f64;
        let unexpected_ratio = unexpected_count as f64 / denominator as f64;
        (expected_ratio >= mostly, unexpected_ratio * 100.0)
    };

    let partial_unexpected_list = unexpected
        .iter()
        .take(PARTIAL_UNEXPECTED_LIMIT)
        .map(|cell| match cell {
            CellValue::Null => "null".to_string(),
            other => other.render(),
        })
        .collect();

    finish(
        compiled,
        success,
        ExpectationOutcome {
            element_count,
            missing_count,
            unexpected_count,
            unexpected_percent,
            partial_unexpected_list,
            observed_value: None,
        },
        ExceptionInfo::default(),
    )
}

/// Per-value test for the value-checking column-map expectations.
enum ValuePredicate<'a> {
    Types(Vec<ValueType>),
    Between {
        min: Option<f64>,
        max: Option<f64>,
        strict_min: bool,
        strict_max: bool,
    },
    InSet {
        text: BTreeSet<&'a str>,
        numbers: Vec<f64>,
    },
    Regex(&'a Regex),
    Unique(HashMap<String, usize>),
    Lengths {
        min: Option<usize>,
        max: Option<usize>,
    },
    Any,
}

impl<'a> ValuePredicate<'a> {
    fn new(
        compiled: &'a CompiledExpectation,
        expectation: &'a Expectation,
        cells: &[CellValue],
    ) -> Self {
        match expectation {
            Expectation::ColumnValuesOfType { value_type, .. } => Self::Types(vec![*value_type]),
            Expectation::ColumnValuesInTypeList { types, .. } => Self::Types(types.clone()),
            Expectation::ColumnValuesBetween {
                min,
                max,
                strict_min,
                strict_max,
                ..
            } => Self::Between {
                min: *min,
                max: *max,
                strict_min: *strict_min,
                strict_max: *strict_max,
            },
            Expectation::ColumnValuesInSet { values, .. } => Self::InSet {
                text: values.iter().map(String::as_str).collect(),
                numbers: values.iter().filter_map(|value| parse_f64(value)).collect(),
            },
            Expectation::ColumnValuesMatchRegex { .. } => match &compiled.regex {
                Some(regex) => Self::Regex(regex),
                None => Self::Any,
            },
            Expectation::ColumnValuesUnique { .. } => {
                let mut counts = HashMap::new();
                for cell in cells.iter().filter(|cell| !cell.is_missing()) {
                    *counts.entry(cell.render()).or_insert(0usize) += 1;
                }
                Self::Unique(counts)
            }
            Expectation::ColumnValueLengthsBetween { min, max, .. } => Self::Lengths {
                min: *min,
                max: *max,
            },
            _ => Self::Any,
        }
    }

    fn accepts(&self, cell: &CellValue) -> bool {
        match self {
            Self::Types(types) => types.iter().any(|ty| conforms(cell, *ty)),
            Self::Between {
                min,
                max,
                strict_min,
                strict_max,
            } => {
                let Some(value) = cell.as_f64() else {
                    return false;
                };
                let above = match min {
                    Some(min) if *strict_min => value > *min,
                    Some(min) => value >= *min,
                    None => true,
                };
                let below = match max {
                    Some(max) if *strict_max => value < *max,
                    Some(max) => value <= *max,
                    None => true,
                };
                above && below
            }
            Self::InSet { text, numbers } => {
                let rendered = cell.render();
                if text.contains(rendered.trim()) {
                    return true;
                }
                match cell.as_f64() {
                    Some(value) => numbers.iter().any(|candidate| *candidate == value),
                    None => false,
                }
            }
            Self::Regex(regex) => regex.is_match(&cell.render()),
            Self::Unique(counts) => counts.get(&cell.render()).is_none_or(|count| *count <= 1),
            Self::Lengths { min, max } => {
                let length = cell.render().chars().count();
                min.is_none_or(|min| length >= min) && max.is_none_or(|max| length <= max)
            }
            Self::Any => true,
        }
    }
}

/// Whether a present cell can be read as the given type.
pub fn conforms(cell: &CellValue, value_type: ValueType) -> bool {
    match (value_type, cell) {
        (_, CellValue::Null) => false,
        (ValueType::String, _) => true,
        (ValueType::Integer, CellValue::Int(_)) => true,
        (ValueType::Integer, CellValue::Float(value)) => value.fract() == 0.0,
        (ValueType::Integer, CellValue::Text(text)) => parse_i64(text).is_some(),
        (ValueType::Float, CellValue::Int(_) | CellValue::Float(_)) => true,
        (ValueType::Float, CellValue::Text(text)) => parse_f64(text).is_some(),
        (ValueType::Boolean, CellValue::Bool(_)) => true,
        (ValueType::Boolean, CellValue::Text(text)) => {
            matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "false")
        }
        (ValueType::Integer | ValueType::Float, CellValue::Bool(_))
        | (ValueType::Boolean, CellValue::Int(_) | CellValue::Float(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_conformance() {
        assert!(conforms(&CellValue::Text("85000".into()), ValueType::Integer));
        assert!(!conforms(&CellValue::Text("85000.5".into()), ValueType::Integer));
        assert!(conforms(&CellValue::Text("85000.5".into()), ValueType::Float));
        assert!(!conforms(&CellValue::Text("abc".into()), ValueType::Float));
        assert!(conforms(&CellValue::Text("abc".into()), ValueType::String));
        assert!(conforms(&CellValue::Int(3), ValueType::String));
        assert!(conforms(&CellValue::Text(" TRUE ".into()), ValueType::Boolean));
        assert!(!conforms(&CellValue::Int(1), ValueType::Boolean));
        assert!(conforms(&CellValue::Float(2.0), ValueType::Integer));
    }

    #[test]
    fn unknown_expectation_fails_compilation() {
        let suite = ExpectationSuite::new("s")
            .with_expectation(ExpectationConfiguration::new("expect_magic").with_kwarg("column", "a"));
        let err = ExpectationEngine::compile(&suite).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn invalid_regex_fails_compilation() {
        let suite = ExpectationSuite::new("s").with_expectation(
            ExpectationConfiguration::new("expect_column_values_to_match_regex")
                .with_kwarg("column", "a")
                .with_kwarg("regex", "("),
        );
        assert!(matches!(
            ExpectationEngine::compile(&suite).unwrap_err(),
            CheckpointError::InvalidRegex { .. }
        ));
    }
}
