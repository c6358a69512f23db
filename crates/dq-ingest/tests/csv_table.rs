use std::fs;
use std::path::PathBuf;

use dq_ingest::{CellValue, IngestError, LoadOptions, load_csv};
use proptest::prelude::*;

fn temp_csv(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write csv");
    path
}

#[test]
fn loads_rows_columns_and_types() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(
        &dir,
        "salaries.csv",
        b"salary,year,title\n100000,2024,Engineer\n85000.5,2023,Analyst\n,2022,\n",
    );
    let table = load_csv(&path, &LoadOptions::default()).expect("load csv");

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_names(), vec!["salary", "year", "title"]);
    assert_eq!(table.source(), path.as_path());

    let years = table.cells("year").unwrap();
    assert_eq!(years[0], CellValue::Int(2024));
    let salaries = table.cells("salary").unwrap();
    assert_eq!(salaries[1], CellValue::Float(85000.5));
    assert!(salaries[2].is_missing());
}

#[test]
fn non_numeric_value_keeps_column_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "s.csv", b"salary,year\n100,2024\nabc,2024\n200,2023\n");
    let table = load_csv(&path, &LoadOptions::default()).unwrap();
    let salaries = table.cells("salary").unwrap();
    assert_eq!(salaries[1], CellValue::Text("abc".to_string()));
    assert_eq!(salaries[0].as_f64(), Some(100.0));
}

#[test]
fn header_only_file_has_zero_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "empty.csv", b"salary,year\n");
    let table = load_csv(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.row_count(), 0);
    assert_eq!(table.column_names(), vec!["salary", "year"]);
}

#[test]
fn blank_lines_are_not_rows() {
    let dir = tempfile::tempdir().unwrap();
    let cases: [&[u8]; 4] = [
        b"salary,year\n1,2\n3,4\n\n",
        b"salary,year\r\n1,2\r\n3,4\r\n\r\n",
        b"salary,year\n1,2\n\n3,4\n",
        b"salary,year\n\n1,2\n3,4",
    ];
    for (idx, contents) in cases.into_iter().enumerate() {
        let path = temp_csv(&dir, &format!("blank{idx}.csv"), contents);
        let table = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.row_count(), 2, "case {idx}");
        assert_eq!(table.column_names(), vec!["salary", "year"]);
        assert_eq!(
            table.cells("salary").unwrap(),
            vec![CellValue::Int(1), CellValue::Int(3)]
        );
    }
}

#[test]
fn bare_quote_inside_a_field_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "quote.csv", b"id,name\n1,ab\"c\n2,\"x,y\"\n");
    let table = load_csv(&path, &LoadOptions::default()).unwrap();
    assert_eq!(
        table.cells("name").unwrap(),
        vec![
            CellValue::Text("ab\"c".to_string()),
            CellValue::Text("x,y".to_string())
        ]
    );
}

#[test]
fn sampled_type_is_widened_when_later_rows_disagree() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "widen.csv", b"salary,flag\n1,true\n2,FALSE\n2.5,\nabc,true\n");
    let options = LoadOptions {
        infer_schema_rows: Some(2),
        ..LoadOptions::default()
    };
    let table = load_csv(&path, &options).unwrap();
    let salaries = table.cells("salary").unwrap();
    assert_eq!(salaries[2], CellValue::Text("2.5".to_string()));
    assert_eq!(salaries[3], CellValue::Text("abc".to_string()));
    let flags = table.cells("flag").unwrap();
    assert_eq!(flags[1], CellValue::Bool(false));
    assert_eq!(flags[2], CellValue::Null);
}

#[test]
fn ragged_row_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "ragged.csv", b"a,b\n1,2\n3,4,5\n");
    let err = load_csv(&path, &LoadOptions::default()).unwrap_err();
    match err {
        IngestError::RaggedRow {
            line,
            expected,
            found,
            ..
        } => {
            assert_eq!(line, 3);
            assert_eq!(expected, 2);
            assert_eq!(found, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_utf8_is_an_encoding_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "latin1.csv", b"name,city\nJos\xe9,M\xe1laga\n");
    let err = load_csv(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::Encoding { line: 2, .. }));
}

#[test]
fn duplicate_and_empty_headers_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dup = temp_csv(&dir, "dup.csv", b"a,a\n1,2\n");
    assert!(matches!(
        load_csv(&dup, &LoadOptions::default()).unwrap_err(),
        IngestError::DuplicateColumn { .. }
    ));
    let blank = temp_csv(&dir, "blank.csv", b"a,\n1,2\n");
    assert!(matches!(
        load_csv(&blank, &LoadOptions::default()).unwrap_err(),
        IngestError::EmptyHeader { index: 2, .. }
    ));
}

#[test]
fn empty_file_has_no_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "nothing.csv", b"");
    assert!(matches!(
        load_csv(&path, &LoadOptions::default()).unwrap_err(),
        IngestError::MissingHeader { .. }
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_csv(&dir.path().join("absent.csv"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}

#[test]
fn custom_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_csv(&dir, "semi.csv", b"salary;year\n1;2024\n2;2023\n");
    let options = LoadOptions {
        delimiter: b';',
        ..LoadOptions::default()
    };
    let table = load_csv(&path, &options).unwrap();
    assert_eq!(table.column_names(), vec!["salary", "year"]);
    assert_eq!(table.row_count(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn row_and_column_counts_match_input(
        columns in prop::collection::btree_set("[a-z]{1,8}", 1..6),
        values in prop::collection::vec(prop::collection::vec("[a-zA-Z0-9]{1,6}", 6), 0..40),
        blank_after in prop::collection::vec(any::<bool>(), 40),
        crlf in any::<bool>(),
    ) {
        let newline = if crlf { "\r\n" } else { "\n" };
        let columns: Vec<String> = columns.into_iter().collect();
        let mut contents = columns.join(",");
        contents.push_str(newline);
        for (row, blank) in values.iter().zip(&blank_after) {
            contents.push_str(&row[..columns.len()].join(","));
            contents.push_str(newline);
            if *blank {
                contents.push_str(newline);
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = temp_csv(&dir, "prop.csv", contents.as_bytes());
        let table = load_csv(&path, &LoadOptions::default()).unwrap();

        prop_assert_eq!(table.row_count(), values.len());
        prop_assert_eq!(table.column_names(), columns);
    }
}
