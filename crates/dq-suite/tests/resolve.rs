use std::fs;
use std::path::Path;

use dq_model::{ExpectationConfiguration, ExpectationSuite};
use dq_suite::{
    SaveOutcome, SuiteError, SuiteStore, add_or_update, convert_yaml, list_suites, load_suite,
};

const SUITE_NAME: &str = "surveys.developer_salaries.csv_schema_warning";

fn salary_suite(name: &str) -> ExpectationSuite {
    ExpectationSuite::new(name).with_expectation(
        ExpectationConfiguration::new("expect_column_values_to_be_of_type")
            .with_kwarg("column", "salary")
            .with_kwarg("type_", "float"),
    )
}

fn write_raw(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn registered_suite_resolves_by_exact_name() {
    let dir = tempfile::tempdir().unwrap();
    let (path, outcome) = add_or_update(dir.path(), &salary_suite(SUITE_NAME)).unwrap();
    assert_eq!(outcome, SaveOutcome::Created);
    assert!(path.ends_with("expectations/surveys/developer_salaries/csv_schema_warning.json"));

    let suite = load_suite(dir.path(), SUITE_NAME).unwrap();
    assert_eq!(suite, salary_suite(SUITE_NAME));

    let (_, outcome) = add_or_update(dir.path(), &salary_suite(SUITE_NAME)).unwrap();
    assert_eq!(outcome, SaveOutcome::Updated);
}

#[test]
fn case_and_separator_mismatches_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    add_or_update(dir.path(), &salary_suite(SUITE_NAME)).unwrap();

    for name in [
        "Surveys.Developer_Salaries.CSV_Schema_Warning",
        "surveys/developer_salaries/csv_schema_warning",
        "surveys_developer_salaries_csv_schema_warning",
        "surveys.developer_salaries..csv_schema_warning",
        "surveys.developer_salaries",
    ] {
        let err = load_suite(dir.path(), name).unwrap_err();
        assert!(
            matches!(err, SuiteError::NotFound { .. }),
            "{name} resolved to {err:?}"
        );
    }
}

#[test]
fn stored_name_must_match_requested_name() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        dir.path(),
        "expectations/surveys/salaries.json",
        r#"{"expectation_suite_name": "surveys.Salaries", "expectations": []}"#,
    );
    assert!(matches!(
        load_suite(dir.path(), "surveys.salaries").unwrap_err(),
        SuiteError::NotFound { .. }
    ));
    assert!(list_suites(dir.path()).unwrap().is_empty());
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(dir.path(), "expectations/broken.json", "{ not json");
    assert!(matches!(
        load_suite(dir.path(), "broken").unwrap_err(),
        SuiteError::Json { .. }
    ));
}

#[test]
fn list_is_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let store = SuiteStore::new(dir.path());
    for name in ["zeta", "alpha.beta", SUITE_NAME] {
        store.add_or_update(&salary_suite(name)).unwrap();
    }
    write_raw(dir.path(), "expectations/notes.txt", "ignored");
    assert_eq!(
        store.list().unwrap(),
        vec!["alpha.beta".to_string(), SUITE_NAME.to_string(), "zeta".to_string()]
    );
}

#[test]
fn missing_expectations_dir_lists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(list_suites(dir.path()).unwrap().is_empty());
}

#[test]
fn yaml_conversion_registers_suite_under_its_name() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("csv_schema_warning.yml");
    fs::write(
        &yaml,
        format!(
            "expectation_suite_name: {SUITE_NAME}\n\
             expectations:\n\
             \x20 - expectation_type: expect_column_to_exist\n\
             \x20   kwargs:\n\
             \x20     column: salary\n\
             \x20 - expectation_type: expect_column_values_to_be_between\n\
             \x20   kwargs:\n\
             \x20     column: year\n\
             \x20     min_value: 2000\n\
             \x20     mostly: 0.9\n"
        ),
    )
    .unwrap();

    let store = SuiteStore::new(dir.path().join("gx"));
    let conversion = convert_yaml(&yaml, &store, None).unwrap();
    assert_eq!(conversion.suite_name, SUITE_NAME);
    assert_eq!(conversion.expectations, 2);
    assert_eq!(conversion.outcome, Some(SaveOutcome::Created));

    let suite = store.get(SUITE_NAME).unwrap();
    assert_eq!(suite.expectations[1].kwargs["min_value"], 2000);
    assert_eq!(suite.expectations[1].kwargs["mostly"], 0.9);
}

#[test]
fn yaml_conversion_to_explicit_output() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("suite.yaml");
    fs::write(&yaml, "expectation_suite_name: adhoc\nexpectations: []\n").unwrap();
    let output = dir.path().join("out/adhoc.json");

    let store = SuiteStore::new(dir.path().join("gx"));
    let conversion = convert_yaml(&yaml, &store, Some(&output)).unwrap();
    assert_eq!(conversion.destination, output);
    assert!(conversion.outcome.is_none());
    assert_eq!(dq_suite::read_suite_json(&output).unwrap().name(), "adhoc");
}

#[test]
fn yaml_that_is_not_a_suite_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("bad.yaml");
    fs::write(&yaml, "- just\n- a list\n").unwrap();
    let store = SuiteStore::new(dir.path());
    assert!(matches!(
        convert_yaml(&yaml, &store, None).unwrap_err(),
        SuiteError::Yaml { .. }
    ));
}
