use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

pub const DEFAULT_RUN_NAME_TEMPLATE: &str = "%Y%m%d-%H%M%S-csv-schema-checks";
pub const RUNTIME_DATA_CONNECTOR: &str = "default_runtime_data_connector_name";
pub const INFERRED_DATA_CONNECTOR: &str = "default_inferred_data_connector_name";

/// Post-run action, identified by `class_name` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum ActionKind {
    StoreValidationResultAction,
    StoreEvaluationParametersAction,
    UpdateDataDocsAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    pub action: ActionKind,
}

impl ActionConfig {
    pub fn new(name: impl Into<String>, action: ActionKind) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }

    /// Resolve one of the short action names used in `dq.toml`.
    pub fn from_short_name(name: &str) -> Result<Self> {
        let action = match name {
            "store_validation_result" => ActionKind::StoreValidationResultAction,
            "store_evaluation_params" => ActionKind::StoreEvaluationParametersAction,
            "update_data_docs" => ActionKind::UpdateDataDocsAction,
            other => return Err(ModelError::UnknownAction(other.to_string())),
        };
        Ok(Self::new(name, action))
    }

    /// Persist result, persist parameters, render docs.
    pub fn default_list() -> Vec<Self> {
        vec![
            Self::new(
                "store_validation_result",
                ActionKind::StoreValidationResultAction,
            ),
            Self::new(
                "store_evaluation_params",
                ActionKind::StoreEvaluationParametersAction,
            ),
            Self::new("update_data_docs", ActionKind::UpdateDataDocsAction),
        ]
    }
}

/// Describes which data a validation evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub datasource_name: String,
    pub data_connector_name: String,
    pub data_asset_name: String,
    #[serde(default)]
    pub batch_identifiers: BTreeMap<String, String>,
}

impl BatchRequest {
    pub fn runtime(datasource_name: impl Into<String>, data_asset_name: impl Into<String>) -> Self {
        let mut batch_identifiers = BTreeMap::new();
        batch_identifiers.insert("default_identifier_name".to_string(), "csv_batch".to_string());
        Self {
            datasource_name: datasource_name.into(),
            data_connector_name: RUNTIME_DATA_CONNECTOR.to_string(),
            data_asset_name: data_asset_name.into(),
            batch_identifiers,
        }
    }

    /// Stable identifier for the batch, used in store paths and docs.
    pub fn batch_id(&self) -> String {
        let mut parts = vec![
            self.datasource_name.clone(),
            self.data_connector_name.clone(),
            self.data_asset_name.clone(),
        ];
        for (key, value) in &self.batch_identifiers {
            parts.push(format!("{key}={value}"));
        }
        parts.join("-")
    }
}

/// One (batch, suite, actions) entry of a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointValidation {
    pub batch_request: BatchRequest,
    pub expectation_suite_name: String,
    #[serde(default)]
    pub action_list: Vec<ActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Falls back to the file stem when loaded from `checkpoints/<name>.toml`.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_run_name_template")]
    pub run_name_template: String,
    /// Explicit run name; takes precedence over the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
    #[serde(default)]
    pub action_list: Vec<ActionConfig>,
    #[serde(default)]
    pub validations: Vec<CheckpointValidation>,
}

fn default_run_name_template() -> String {
    DEFAULT_RUN_NAME_TEMPLATE.to_string()
}

impl CheckpointConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_name_template: default_run_name_template(),
            run_name: None,
            action_list: Vec::new(),
            validations: Vec::new(),
        }
    }
}

/// Merge checkpoint-level and per-validation action lists.
///
/// Checkpoint actions run first; a validation action with the same name
/// replaces the checkpoint one in place, other validation actions are
/// appended. Names must be unique within each list.
pub fn merge_action_lists(
    checkpoint: &[ActionConfig],
    validation: &[ActionConfig],
) -> Result<Vec<ActionConfig>> {
    ensure_unique_names(checkpoint)?;
    ensure_unique_names(validation)?;
    let mut merged: Vec<ActionConfig> = checkpoint.to_vec();
    for action in validation {
        match merged.iter_mut().find(|existing| existing.name == action.name) {
            Some(existing) => *existing = action.clone(),
            None => merged.push(action.clone()),
        }
    }
    Ok(merged)
}

fn ensure_unique_names(actions: &[ActionConfig]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for action in actions {
        if !seen.insert(action.name.as_str()) {
            return Err(ModelError::DuplicateAction {
                name: action.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_actions_override_by_name() {
        let checkpoint = ActionConfig::default_list();
        let validation = vec![
            ActionConfig::new("update_data_docs", ActionKind::StoreValidationResultAction),
            ActionConfig::new("extra", ActionKind::UpdateDataDocsAction),
        ];
        let merged = merge_action_lists(&checkpoint, &validation).unwrap();
        let names: Vec<&str> = merged.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "store_validation_result",
                "store_evaluation_params",
                "update_data_docs",
                "extra"
            ]
        );
        assert_eq!(merged[2].action, ActionKind::StoreValidationResultAction);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let list = vec![
            ActionConfig::new("a", ActionKind::UpdateDataDocsAction),
            ActionConfig::new("a", ActionKind::StoreValidationResultAction),
        ];
        assert_eq!(
            merge_action_lists(&list, &[]).unwrap_err(),
            ModelError::DuplicateAction {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn action_class_name_round_trips_through_json() {
        let json = r#"{"name":"store","action":{"class_name":"StoreValidationResultAction"}}"#;
        let action: ActionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(action.action, ActionKind::StoreValidationResultAction);
    }

    #[test]
    fn unknown_short_action_name() {
        assert!(ActionConfig::from_short_name("notify_slack").is_err());
    }

    #[test]
    fn runtime_batch_id_is_stable() {
        let request = BatchRequest::runtime("runtime_datasource", "salaries");
        insta::assert_snapshot!(
            request.batch_id(),
            @"runtime_datasource-default_runtime_data_connector_name-salaries-default_identifier_name=csv_batch"
        );
    }
}
