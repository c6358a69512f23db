use std::fs;

use dq_ingest::{LoadOptions, load_csv};
use dq_model::{ExpectationConfiguration, ExpectationSuite, ExpectationValidationResult};
use dq_validate::ExpectationEngine;
use serde_json::json;

fn evaluate(contents: &str, config: ExpectationConfiguration) -> ExpectationValidationResult {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(&path, contents).unwrap();
    let table = load_csv(&path, &LoadOptions::default()).unwrap();
    let suite = ExpectationSuite::new("checks").with_expectation(config);
    ExpectationEngine::compile(&suite)
        .unwrap()
        .evaluate(&table)
        .remove(0)
}

fn column_check(expectation_type: &str, column: &str) -> ExpectationConfiguration {
    ExpectationConfiguration::new(expectation_type).with_kwarg("column", column)
}

#[test]
fn mostly_boundary_is_inclusive() {
    let mut contents = String::from("salary\n7\n");
    for _ in 0..9 {
        contents.push_str("abc\n");
    }
    let at_boundary = evaluate(
        &contents,
        column_check("expect_column_values_to_be_of_type", "salary")
            .with_kwarg("type_", "int")
            .with_kwarg("mostly", 0.1),
    );
    assert_eq!(at_boundary.result.unexpected_count, 9);
    assert!(at_boundary.success);

    let above = evaluate(
        &contents,
        column_check("expect_column_values_to_be_of_type", "salary")
            .with_kwarg("type_", "int")
            .with_kwarg("mostly", 0.11),
    );
    assert!(!above.success);

    let nulls = evaluate(
        "a,b\n1,\n2,2\n3,3\n4,4\n5,5\n6,6\n7,7\n8,8\n9,9\n10,10\n",
        column_check("expect_column_values_to_not_be_null", "b").with_kwarg("mostly", 0.9),
    );
    assert_eq!(nulls.result.unexpected_count, 1);
    assert!(nulls.success);
}

#[test]
fn columns_match_set_with_and_without_exact_match() {
    let csv = "a,b,c\n1,2,3\n";
    let set = |columns: serde_json::Value| {
        ExpectationConfiguration::new("expect_table_columns_to_match_set")
            .with_kwarg("column_set", columns)
    };

    assert!(evaluate(csv, set(json!(["c", "a", "b"]))).success);
    assert!(!evaluate(csv, set(json!(["a", "b"]))).success);
    assert!(evaluate(csv, set(json!(["b", "a"])).with_kwarg("exact_match", false)).success);
    let missing = evaluate(csv, set(json!(["a", "z"])).with_kwarg("exact_match", false));
    assert!(!missing.success);
    assert_eq!(missing.result.observed_value, Some(json!(["a", "b", "c"])));
}

#[test]
fn column_count_to_equal() {
    let csv = "a,b,c\n1,2,3\n";
    let count = |value: u64| {
        ExpectationConfiguration::new("expect_table_column_count_to_equal").with_kwarg("value", value)
    };
    let pass = evaluate(csv, count(3));
    assert!(pass.success);
    assert_eq!(pass.result.observed_value, Some(json!(3)));
    assert!(!evaluate(csv, count(2)).success);
}

#[test]
fn row_count_to_equal() {
    let csv = "a\n1\n2\n";
    let count = |value: u64| {
        ExpectationConfiguration::new("expect_table_row_count_to_equal").with_kwarg("value", value)
    };
    assert!(evaluate(csv, count(2)).success);
    let fail = evaluate(csv, count(3));
    assert!(!fail.success);
    assert_eq!(fail.result.observed_value, Some(json!(2)));
}

#[test]
fn values_to_be_null() {
    let csv = "a,b\n1,\n2,\n";
    assert!(evaluate(csv, column_check("expect_column_values_to_be_null", "b")).success);
    let fail = evaluate(csv, column_check("expect_column_values_to_be_null", "a"));
    assert!(!fail.success);
    assert_eq!(fail.result.unexpected_count, 2);
    assert_eq!(fail.result.partial_unexpected_list, vec!["1", "2"]);
}

#[test]
fn values_in_type_list() {
    let csv = "v\n1\n2.5\nabc\n";
    let types = |list: serde_json::Value| {
        column_check("expect_column_values_to_be_in_type_list", "v").with_kwarg("type_list", list)
    };

    let fail = evaluate(csv, types(json!(["int", "float"])));
    assert!(!fail.success);
    assert_eq!(fail.result.partial_unexpected_list, vec!["abc"]);
    assert!(evaluate(csv, types(json!(["int", "float"])).with_kwarg("mostly", 0.6)).success);
    assert!(evaluate(csv, types(json!(["int", "str"]))).success);
}

#[test]
fn values_to_be_unique_counts_every_duplicate() {
    let fail = evaluate("v\n1\n2\n2\n3\n", column_check("expect_column_values_to_be_unique", "v"));
    assert!(!fail.success);
    assert_eq!(fail.result.unexpected_count, 2);
    assert_eq!(fail.result.partial_unexpected_list, vec!["2", "2"]);

    let nulls_are_not_duplicates = evaluate(
        "v,w\n1,a\n,b\n,c\n3,d\n",
        column_check("expect_column_values_to_be_unique", "v"),
    );
    assert!(nulls_are_not_duplicates.success);
    assert_eq!(nulls_are_not_duplicates.result.missing_count, 2);
}

#[test]
fn value_lengths_between() {
    let csv = "code\nab\nabc\nabcdef\n";
    let fail = evaluate(
        csv,
        column_check("expect_column_value_lengths_to_be_between", "code")
            .with_kwarg("min_value", 2)
            .with_kwarg("max_value", 4),
    );
    assert!(!fail.success);
    assert_eq!(fail.result.partial_unexpected_list, vec!["abcdef"]);

    let pass = evaluate(
        csv,
        column_check("expect_column_value_lengths_to_be_between", "code").with_kwarg("min_value", 2),
    );
    assert!(pass.success);
}

#[test]
fn values_between_honours_strict_bounds() {
    let csv = "v\n1\n5\n10\n";
    let between = || {
        column_check("expect_column_values_to_be_between", "v")
            .with_kwarg("min_value", 1)
            .with_kwarg("max_value", 10)
    };

    assert!(evaluate(csv, between()).success);
    let strict_min = evaluate(csv, between().with_kwarg("strict_min", true));
    assert!(!strict_min.success);
    assert_eq!(strict_min.result.partial_unexpected_list, vec!["1"]);
    let strict_max = evaluate(csv, between().with_kwarg("strict_max", true));
    assert!(!strict_max.success);
    assert_eq!(strict_max.result.partial_unexpected_list, vec!["10"]);
}

#[test]
fn values_match_regex() {
    let email = || {
        column_check("expect_column_values_to_match_regex", "email")
            .with_kwarg("regex", "^[^@]+@[^@]+$")
    };
    assert!(evaluate("email\na@x.io\nb@y.org\n", email()).success);

    let fail = evaluate("email\na@x.io\nbad\n", email());
    assert!(!fail.success);
    assert_eq!(fail.result.unexpected_count, 1);
    assert!((fail.result.unexpected_percent - 50.0).abs() < 1e-9);
    assert_eq!(fail.result.partial_unexpected_list, vec!["bad"]);
}
