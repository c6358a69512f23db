use std::fs;

use chrono::{TimeZone, Utc};
use dq_model::{
    ExceptionInfo, ExpectationConfiguration, ExpectationOutcome, ExpectationValidationResult,
    RunIdentifier, ValidationResult,
};
use dq_report::{DataDocsSite, EvaluationParameterStore, ValidationsStore};
use serde_json::json;

fn salary_result(hour: u32, success: bool) -> ValidationResult {
    let run_id = RunIdentifier::new(
        format!("20240501-{hour:02}0000-csv-schema-checks"),
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
    );
    let type_check = ExpectationValidationResult {
        success,
        expectation_config: ExpectationConfiguration::new("expect_column_values_to_be_of_type")
            .with_kwarg("column", "salary")
            .with_kwarg("type_", "float"),
        result: ExpectationOutcome {
            element_count: 2,
            missing_count: 0,
            unexpected_count: u64::from(!success),
            unexpected_percent: if success { 0.0 } else { 50.0 },
            partial_unexpected_list: if success {
                Vec::new()
            } else {
                vec!["<abc>".to_string()]
            },
            observed_value: None,
        },
        exception_info: ExceptionInfo::default(),
    };
    let row_count = ExpectationValidationResult {
        success: true,
        expectation_config: ExpectationConfiguration::new("expect_table_row_count_to_be_between")
            .with_kwarg("min_value", 1),
        result: ExpectationOutcome {
            observed_value: Some(json!(3)),
            ..ExpectationOutcome::default()
        },
        exception_info: ExceptionInfo::default(),
    };
    ValidationResult::new(
        "surveys.developer_salaries.csv_schema_warning",
        run_id,
        "runtime_datasource-default_runtime_data_connector_name-salaries-default_identifier_name=csv_batch",
        "salaries",
        vec![type_check, row_count],
    )
}

#[test]
fn validations_store_round_trips_results() {
    let dir = tempfile::tempdir().unwrap();
    let store = ValidationsStore::new(dir.path().join("validations"));
    let first = salary_result(10, true);
    let second = salary_result(11, false);

    let path = store.store(&first).unwrap();
    store.store(&second).unwrap();
    assert!(path.starts_with(store.base()));
    assert_eq!(store.load(&path).unwrap(), first);

    let all = store.load_all().unwrap();
    assert_eq!(all, vec![first, second]);
}

#[test]
fn evaluation_parameters_publish_observed_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = EvaluationParameterStore::new(dir.path().join("evaluation_parameters"));
    let result = salary_result(10, true);
    let path = store.store(&result).unwrap();
    let params = store.load(&path).unwrap();

    assert_eq!(
        params.parameters.get(
            "urn:dq:validations:surveys.developer_salaries.csv_schema_warning:expect_table_row_count_to_be_between.result.observed_value"
        ),
        Some(&json!(3))
    );
    assert_eq!(
        params.parameters.get(
            "urn:dq:validations:surveys.developer_salaries.csv_schema_warning:statistics.success_percent"
        ),
        Some(&json!(100.0))
    );
}

#[test]
fn docs_site_links_every_result_and_escapes_values() {
    let dir = tempfile::tempdir().unwrap();
    let site = DataDocsSite::new(dir.path().join("data_docs/local_site"));
    let passed = salary_result(10, true);
    let failed = salary_result(11, false);

    let index = site.build(&[passed.clone(), failed.clone()]).unwrap();
    assert_eq!(index, site.index_path());

    let html = fs::read_to_string(&index).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    let newest = html.find("20240501-110000-csv-schema-checks").unwrap();
    let oldest = html.find("20240501-100000-csv-schema-checks").unwrap();
    assert!(newest < oldest, "index lists newest run first");
    assert!(html.contains("validations/surveys/developer_salaries/csv_schema_warning/"));

    let page = fs::read_to_string(site.page_path(&failed)).unwrap();
    assert!(page.contains("expect_column_values_to_be_of_type"));
    assert!(page.contains("&lt;abc&gt;"));
    assert!(!page.contains("<abc>"));
    assert!(page.contains("../../../../../../index.html"));
}

#[test]
fn empty_site_still_has_an_index() {
    let dir = tempfile::tempdir().unwrap();
    let site = DataDocsSite::new(dir.path().join("site"));
    let index = site.build(&[]).unwrap();
    let html = fs::read_to_string(index).unwrap();
    assert!(html.contains("No validation results yet."));
}
