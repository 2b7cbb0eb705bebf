//! HTML rendering of a [`QualityReport`]. Produces a string only; where it
//! goes is the caller's business.

use std::fmt::Write;

use chrono::Local;

use crate::{core::quality::QualityReport, fmt::FormattedPercentage};

const STYLE: &str = "
body { font-family: Arial, sans-serif; margin: 20px; background-color: #f5f5f5; }
h1 { color: #333; border-bottom: 2px solid #4CAF50; padding-bottom: 10px; }
.section { background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px;
           box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.metric { display: inline-block; margin: 10px 20px; }
.metric-value { font-size: 24px; font-weight: bold; color: #4CAF50; }
.metric-label { color: #666; font-size: 14px; }
.issue { background: #fff3cd; border-left: 4px solid #ffc107; padding: 10px; margin: 10px 0; }
.success { background: #d4edda; border-left: 4px solid #28a745; padding: 10px; margin: 10px 0; }
table { width: 100%; border-collapse: collapse; margin-top: 10px; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid #ddd; }
th { background-color: #f2f2f2; }
";

/// How many individual findings of one kind to spell out before eliding.
const N_LISTED: usize = 20;

#[must_use]
#[allow(clippy::too_many_lines)]
pub fn render_html(report: &QualityReport) -> String {
    let mut html = String::new();
    let out = &mut html;

    // Writing into a `String` cannot fail.
    let _ = writeln!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<title>SVK Data Quality Report</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>SVK Data Quality Report</h1>\n\
         <p>Generated: {}</p>",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
    );

    let _ = writeln!(
        out,
        "<div class=\"section\">\n<h2>Summary</h2>\n\
         <div class=\"metric\"><div class=\"metric-value\">{}</div>\
         <div class=\"metric-label\">Total Records</div></div>\n\
         <div class=\"metric\"><div class=\"metric-value\">{}</div>\
         <div class=\"metric-label\">Coverage ({})</div></div>\n\
         <div class=\"metric\"><div class=\"metric-value\">{}</div>\
         <div class=\"metric-label\">Status</div></div>\n</div>",
        report.total_records,
        FormattedPercentage(report.coverage_pct),
        report.span,
        if report.is_clean() { "All Checks Passed" } else { "Issues Found" },
    );

    if report.missing_dates.is_empty() {
        let _ = writeln!(out, "<div class=\"success\">Date continuity: no missing dates</div>");
    } else {
        let _ = writeln!(
            out,
            "<div class=\"section\">\n<h2>Missing Dates</h2>\n\
             <p>The following dates have no data:</p>\n<ul>",
        );
        for date in report.missing_dates.iter().take(N_LISTED) {
            let _ = writeln!(out, "<li>{date}</li>");
        }
        if report.missing_dates.len() > N_LISTED {
            let _ = writeln!(out, "<li>… and {} more</li>", report.missing_dates.len() - N_LISTED);
        }
        let _ = writeln!(out, "</ul>\n</div>");
    }

    if !report.partial_days.is_empty() {
        let _ = writeln!(
            out,
            "<div class=\"section\">\n<h2>Partial Days</h2>\n\
             <table><tr><th>Date</th><th>Hours Found</th><th>Hours Missing</th></tr>",
        );
        for partial in &report.partial_days {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                partial.date,
                partial.hours_found,
                24 - partial.hours_found,
            );
        }
        let _ = writeln!(out, "</table>\n</div>");
    }

    if !report.duplicate_keys.is_empty() {
        let _ = writeln!(
            out,
            "<div class=\"section\">\n<h2>Duplicate Keys</h2>\n\
             <table><tr><th>Key</th><th>Records</th></tr>",
        );
        for duplicate in &report.duplicate_keys {
            let _ =
                writeln!(out, "<tr><td>{}</td><td>{}</td></tr>", duplicate.key, duplicate.count);
        }
        let _ = writeln!(out, "</table>\n</div>");
    }

    if !report.missing_values.is_empty() {
        let _ = writeln!(
            out,
            "<div class=\"section\">\n<h2>Missing Values</h2>\n\
             <table><tr><th>Column</th><th>Empty Cells</th></tr>",
        );
        for entry in &report.missing_values {
            let _ = writeln!(out, "<tr><td>{}</td><td>{}</td></tr>", entry.field, entry.count);
        }
        let _ = writeln!(out, "</table>\n</div>");
    }

    if !report.out_of_range.is_empty() {
        let _ = writeln!(
            out,
            "<div class=\"section\">\n<h2>Out-of-Range Values</h2>\n\
             <table><tr><th>Key</th><th>Field</th><th>Value</th></tr>",
        );
        for finding in &report.out_of_range {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{:.1}</td></tr>",
                finding.key, finding.field, finding.value,
            );
        }
        let _ = writeln!(out, "</table>\n</div>");
    }

    let _ = writeln!(out, "</body>\n</html>");
    html
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::core::{
        dataset::Dataset,
        quality::{DateSpan, ValueBounds, check},
        record::{HourRange, Record},
    };

    #[test]
    fn test_render_empty_dataset() {
        let span = DateSpan::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        );
        let report =
            check(&Dataset::default(), span, ValueBounds { min: 0.0, max: 30000.0 });
        let html = render_html(&report);
        assert!(html.contains("Issues Found"));
        assert!(html.contains("<li>2025-03-02</li>"));
        assert!(html.contains("0.0%"));
    }

    #[test]
    fn test_render_missing_values_section() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let dataset = Dataset::from_records(vec![Record {
            date,
            hour_range: "00:00 - 01:00".parse::<HourRange>().unwrap(),
            forecast_mw: Some(12843.4),
            consumption_mw: None,
        }]);
        let report =
            check(&dataset, DateSpan::new(date, date), ValueBounds { min: 0.0, max: 30000.0 });
        let html = render_html(&report);
        assert!(html.contains("<h2>Missing Values</h2>"));
        assert!(html.contains("<tr><td>Förbrukning (MW)</td><td>1</td></tr>"));
    }
}
