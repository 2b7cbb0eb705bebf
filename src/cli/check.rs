use std::fs;

use chrono::Local;

use crate::{
    cli::CheckArgs,
    core::quality::{self, DateSpan},
    prelude::*,
    report::render_html,
    storage::Store,
    tables::{build_findings_table, build_summary_table},
};

/// Quality run: check the master dataset, print the summary, and write the
/// HTML report and JSON metrics.
#[instrument(skip_all)]
pub fn check(args: &CheckArgs) -> Result {
    let dataset = Store::new(&args.data.data_dir).read_master()?;

    let end = args.end_date.unwrap_or_else(|| Local::now().date_naive());
    let span = match args.start_date {
        Some(start) => DateSpan::new(start, end),
        None => DateSpan::trailing(args.window_days, end),
    };
    ensure!(span.start <= span.end, "span start {} is after its end {}", span.start, span.end);

    let report = quality::check(&dataset, span, args.bounds.into());
    info!(
        coverage_pct = report.coverage_pct,
        n_missing = report.missing_dates.len(),
        n_partial = report.partial_days.len(),
        n_duplicates = report.duplicate_keys.len(),
        n_missing_values = report.missing_values.len(),
        n_out_of_range = report.out_of_range.len(),
        "checks completed",
    );

    println!("{}", build_summary_table(&report));
    if !report.is_clean() {
        println!("{}", build_findings_table(&report));
    }

    fs::create_dir_all(&args.report_dir)?;
    let html_file = args.report_dir.join("quality_report.html");
    fs::write(&html_file, render_html(&report))?;
    let metrics_file = args.report_dir.join("quality_metrics.json");
    fs::write(&metrics_file, serde_json::to_vec_pretty(&report)?)?;
    info!(
        html_file = %html_file.display(),
        metrics_file = %metrics_file.display(),
        "report written",
    );
    Ok(())
}
