use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use panel_cli::types::{ClassifyResult, RunResult};
use panel_model::{CheckResult, CheckStatus};

pub fn print_run_summary(result: &RunResult) {
    let report = &result.report;
    if let Some(input) = &report.input {
        println!("Input: {}", input.display());
    }
    if result.dry_run {
        println!("Output: (dry run, nothing written)");
    } else if let Some(output) = &report.output {
        println!("Output: {}", output.display());
    }
    if let Some(path) = &result.report_path {
        println!("Run report: {}", path.display());
    }
    println!(
        "Subjects: {}  Waves: {}  Rows: {}  Columns: {}",
        report.subject_count, report.max_wave, report.row_count, report.column_count
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Prefix"),
        header_cell("Stubs"),
        header_cell("Waves"),
        header_cell("Long rows"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    let mut total_stubs = 0usize;
    for prefix in &report.prefixes {
        total_stubs += prefix.stub_count;
        table.add_row(vec![
            Cell::new(&prefix.prefix).add_attribute(Attribute::Bold),
            count_cell(prefix.stub_count),
            Cell::new(wave_span(&prefix.waves)),
            Cell::new(prefix.long_rows),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_stubs).add_attribute(Attribute::Bold),
        dim_cell(format!("1-{}", report.max_wave)),
        Cell::new(report.row_count).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_check_table(&report.validation.checks);
    if !report.warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in &report.warnings {
            eprintln!("- {warning}");
        }
    }
}

pub fn print_classify_summary(result: &ClassifyResult) {
    println!("Input: {}", result.input.display());
    let invariant = result.classification.time_invariant_columns().len();
    println!(
        "Columns: {}  Time-invariant: {}  Stubs: {}",
        result.classification.len(),
        invariant,
        result.stubs.len()
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Prefix"),
        header_cell("Concept"),
        header_cell("Waves"),
        header_cell("Source columns"),
    ]);
    apply_table_style(&mut table);
    for (stub, entry) in result.stubs.iter() {
        let sources: Vec<&str> = entry.waves.values().map(String::as_str).collect();
        let concept = if stub.is_bare() {
            dim_cell("(in-wave)")
        } else {
            Cell::new(&stub.concept)
        };
        table.add_row(vec![
            Cell::new(&stub.prefix).add_attribute(Attribute::Bold),
            concept,
            Cell::new(wave_span(&entry.observed_waves())),
            Cell::new(sources.join(" ")),
        ]);
    }
    println!("{table}");

    for message in result.classification.suspicious() {
        eprintln!("suspicious: {message}");
    }
    for item in result.stubs.inconsistencies() {
        if item.is_warning() {
            eprintln!("warning: {}", item.message());
        }
    }
}

fn print_check_table(checks: &[CheckResult]) {
    if checks.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Status"),
        header_cell("Expected"),
        header_cell("Observed"),
        header_cell("Samples"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for check in checks {
        let status = match check.status {
            CheckStatus::Pass => Cell::new(check.status.label()).fg(Color::Green),
            CheckStatus::Fail => Cell::new(check.status.label())
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
        };
        table.add_row(vec![
            Cell::new(&check.name),
            status,
            dim_cell(&check.expected),
            Cell::new(&check.observed),
            dim_cell(check.samples.join("; ")),
        ]);
    }
    println!("{table}");
}

/// Compact wave list, e.g. `1-3, 5, 10-14`.
fn wave_span(waves: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = waves.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        parts.push(if start == end {
            start.to_string()
        } else {
            format!("{start}-{end}")
        });
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
