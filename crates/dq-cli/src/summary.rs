use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dq_cli::pipeline::RunOutcome;
use dq_model::{CheckpointResult, ExpectationValidationResult, RunStatus, ValidationResult};

pub fn print_summary(outcome: &RunOutcome) {
    println!("Source: {}", outcome.fetch.location);
    println!(
        "Downloaded: {} ({} bytes, sha256 {})",
        outcome.fetch.destination.display(),
        outcome.fetch.bytes,
        outcome.fetch.sha256
    );
    println!("Rows: {}  Columns: {}", outcome.rows, outcome.columns);
    print_checkpoint(&outcome.checkpoint);
    match &outcome.docs_index {
        Some(path) => println!("Data Docs: file://{}", path.display()),
        None => println!(
            "Data docs index not found at {}; skipping link.",
            outcome.expected_docs_index.display()
        ),
    }
    println!("{}", status_line(outcome.status));
}

pub fn print_checkpoint(result: &CheckpointResult) {
    println!(
        "Checkpoint: {}  Run: {} ({})",
        result.checkpoint_name,
        result.run_id.run_name,
        result.run_id.run_time.to_rfc3339()
    );
    for validation in &result.validation_results {
        println!();
        println!(
            "Suite: {}  Asset: {}",
            validation.expectation_suite_name, validation.data_asset_name
        );
        println!("{}", expectation_table(validation));
        println!("{}", statistics_line(validation));
    }
}

pub fn status_line(status: RunStatus) -> String {
    match status {
        RunStatus::ValidationPassed => "Validation PASSED".to_string(),
        RunStatus::ValidationFailed => "Validation FAILED".to_string(),
        RunStatus::ScriptFailed => "Run FAILED".to_string(),
    }
}

fn statistics_line(validation: &ValidationResult) -> String {
    let stats = &validation.statistics;
    let percent = stats
        .success_percent
        .map_or_else(|| "-".to_string(), |value| format!("{value:.1}%"));
    format!(
        "{} of {} expectations met ({percent})",
        stats.successful_expectations, stats.evaluated_expectations
    )
}

fn expectation_table(validation: &ValidationResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Status"),
        header_cell("Expectation"),
        header_cell("Column"),
        header_cell("Unexpected"),
        header_cell("Percent"),
        header_cell("Sample"),
    ]);
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for result in &validation.results {
        table.add_row(expectation_row(result));
    }
    table
}

fn expectation_row(result: &ExpectationValidationResult) -> Vec<Cell> {
    let outcome = &result.result;
    let sample = if result.exception_info.raised_exception {
        Cell::new(
            result
                .exception_info
                .exception_message
                .clone()
                .unwrap_or_default(),
        )
        .fg(Color::Red)
    } else if outcome.partial_unexpected_list.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(outcome.partial_unexpected_list.join(", "))
    };
    let percent = if outcome.element_count == 0 {
        dim_cell("-")
    } else {
        Cell::new(format!("{:.1}%", outcome.unexpected_percent))
    };
    vec![
        status_cell(result.success),
        Cell::new(&result.expectation_config.expectation_type),
        Cell::new(result.column().unwrap_or("-")),
        count_cell(outcome.unexpected_count),
        percent,
        sample,
    ]
}

fn status_cell(success: bool) -> Cell {
    if success {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("✗").fg(Color::Red).add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: u64) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
