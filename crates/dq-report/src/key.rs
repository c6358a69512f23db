use std::path::PathBuf;

use dq_model::ValidationResult;

/// Location of one validation result inside a store:
/// `<suite segments>/<run name>/<run time>/<batch id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultKey {
    pub suite_segments: Vec<String>,
    pub run_name: String,
    pub run_time: String,
    pub batch_id: String,
}

impl ResultKey {
    pub fn for_result(result: &ValidationResult) -> Self {
        Self {
            suite_segments: result
                .expectation_suite_name
                .split('.')
                .map(path_segment)
                .collect(),
            run_name: path_segment(&result.run_id.run_name),
            run_time: result.run_id.run_time_key(),
            batch_id: path_segment(&result.batch_id),
        }
    }

    pub fn relative_path(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.suite_segments.iter().collect();
        path.push(&self.run_name);
        path.push(&self.run_time);
        path.push(format!("{}.{extension}", self.batch_id));
        path
    }
}

/// Make a value safe as a single path component.
pub fn path_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '=') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|ch| ch == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use dq_model::RunIdentifier;

    use super::*;

    #[test]
    fn key_layout() {
        let run_id = RunIdentifier::new(
            "20240501-120000-csv-schema-checks",
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        );
        let result = ValidationResult::new(
            "surveys.developer_salaries.csv_schema_warning",
            run_id,
            "runtime_datasource-default_runtime_data_connector_name-salaries-default_identifier_name=csv_batch",
            "salaries",
            Vec::new(),
        );
        let path = ResultKey::for_result(&result).relative_path("json");
        insta::assert_snapshot!(
            path.to_string_lossy(),
            @"surveys/developer_salaries/csv_schema_warning/20240501-120000-csv-schema-checks/20240501T120000.000000Z/runtime_datasource-default_runtime_data_connector_name-salaries-default_identifier_name=csv_batch.json"
        );
    }

    #[test]
    fn unsafe_segments_are_replaced() {
        assert_eq!(path_segment("../etc"), ".._etc");
        assert_eq!(path_segment(".."), "_");
        assert_eq!(path_segment("run name/2"), "run_name_2");
        assert_eq!(path_segment(""), "_");
    }
}
