use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::{merge::MergeStats, quality::QualityReport},
    fmt::{FormattedMegawatts, FormattedPercentage},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_summary_table(report: &QualityReport) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Check", "Result"]);
    table.add_row(vec![Cell::new("Span"), Cell::new(report.span)]);
    table.add_row(vec![Cell::new("Total records"), Cell::new(report.total_records)]);
    table.add_row(vec![
        Cell::new("Coverage"),
        Cell::new(FormattedPercentage(report.coverage_pct)).fg(if report.coverage_pct < 90.0 {
            Color::Red
        } else {
            Color::Green
        }),
    ]);
    for (label, count) in [
        ("Missing dates", report.missing_dates.len()),
        ("Partial days", report.partial_days.len()),
        ("Duplicate keys", report.duplicate_keys.len()),
        ("Missing values", report.missing_values.iter().map(|entry| entry.count).sum()),
        ("Out-of-range values", report.out_of_range.len()),
    ] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).fg(if count == 0 { Color::Green } else { Color::Red }),
        ]);
    }
    table
}

pub fn build_findings_table(report: &QualityReport) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Kind", "Where", "Detail"]);
    for date in &report.missing_dates {
        table.add_row(vec![
            Cell::new("missing").fg(Color::Red),
            Cell::new(date),
            Cell::new("no records").add_attribute(Attribute::Dim),
        ]);
    }
    for partial in &report.partial_days {
        table.add_row(vec![
            Cell::new("partial").fg(Color::DarkYellow),
            Cell::new(partial.date),
            Cell::new(format!("{} of 24 hours", partial.hours_found)),
        ]);
    }
    for duplicate in &report.duplicate_keys {
        table.add_row(vec![
            Cell::new("duplicate").fg(Color::Red),
            Cell::new(duplicate.key),
            Cell::new(format!("{} records", duplicate.count)),
        ]);
    }
    for entry in &report.missing_values {
        table.add_row(vec![
            Cell::new("missing values").fg(Color::DarkYellow),
            Cell::new(entry.field),
            Cell::new(format!("{} empty cells", entry.count)),
        ]);
    }
    for finding in &report.out_of_range {
        table.add_row(vec![
            Cell::new("out of range").fg(Color::Red),
            Cell::new(finding.key),
            Cell::new(format!("{} = {}", finding.field, FormattedMegawatts(Some(finding.value))))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_merge_table(stats: &MergeStats) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Inserted", "Updated", "Skipped"]);
    table.add_row(
        [stats.inserted, stats.updated, stats.skipped]
            .iter()
            .map(|count| Cell::new(count).set_alignment(CellAlignment::Right))
            .collect_vec(),
    );
    table
}
