use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::{
    dataset::Dataset,
    record::{HourRange, Record, RecordKey},
};

/// Inclusive calendar span the dataset is expected to cover.
#[derive(Copy, Clone, Serialize, derive_more::Display)]
#[display("{start}..={end}")]
#[must_use]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Trailing window of `n_days` ending at `end` inclusive. A window
    /// reaching past the calendar is clamped rather than panicking.
    pub fn trailing(n_days: u64, end: NaiveDate) -> Self {
        let start = end
            .checked_sub_days(chrono::Days::new(n_days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn iter_dates(self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while(move |date| *date <= self.end)
    }

    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn n_dates(self) -> usize {
        (self.end - self.start).num_days().max(0) as usize + 1
    }
}

/// Plausibility bounds for a megawatt figure.
#[derive(Copy, Clone, Serialize)]
#[must_use]
pub struct ValueBounds {
    pub min: f64,
    pub max: f64,
}

impl ValueBounds {
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Copy, Clone, Serialize, derive_more::Display)]
pub enum Field {
    #[display("Prognos (MW)")]
    Forecast,

    #[display("Förbrukning (MW)")]
    Consumption,
}

/// A date inside the expected span with some, but not all 24, hour slots.
#[derive(Copy, Clone, Serialize)]
pub struct PartialDay {
    pub date: NaiveDate,
    pub hours_found: usize,
}

#[derive(Copy, Clone, Serialize)]
pub struct DuplicateKey {
    pub key: RecordKey,
    pub count: usize,
}

/// How many present records have no figure in one column.
#[derive(Copy, Clone, Serialize)]
pub struct MissingValues {
    pub field: Field,
    pub count: usize,
}

/// A figure outside the plausibility bounds. Reported, never removed.
#[derive(Copy, Clone, Serialize)]
pub struct OutOfRange {
    pub key: RecordKey,
    pub field: Field,
    pub value: f64,
}

/// Structural quality findings over one dataset. Regenerated each run,
/// never persisted as authoritative state.
#[derive(Serialize)]
#[must_use]
pub struct QualityReport {
    pub span: DateSpan,
    pub total_records: usize,
    pub missing_dates: Vec<NaiveDate>,
    pub partial_days: Vec<PartialDay>,
    pub duplicate_keys: Vec<DuplicateKey>,
    pub missing_values: Vec<MissingValues>,
    pub out_of_range: Vec<OutOfRange>,
    pub coverage_pct: f64,
}

impl QualityReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_dates.is_empty()
            && self.partial_days.is_empty()
            && self.duplicate_keys.is_empty()
            && self.missing_values.is_empty()
            && self.out_of_range.is_empty()
    }
}

/// Scan the dataset against the expected span and value bounds.
///
/// Missing-date and coverage checks are scoped to `span`; duplicate,
/// missing-value, and range checks scan the whole dataset. The duplicate check is deliberately
/// independent of the merger's own invariant enforcement, so out-of-band
/// edits to the persisted file still get caught. Pure function, no I/O.
pub fn check(dataset: &Dataset, span: DateSpan, bounds: ValueBounds) -> QualityReport {
    // Distinct hour slots per date: duplicate keys must not inflate a day
    // into looking complete.
    let mut hours_per_date = BTreeMap::<NaiveDate, BTreeSet<HourRange>>::new();
    for record in dataset.iter() {
        hours_per_date.entry(record.date).or_default().insert(record.hour_range);
    }

    let mut missing_dates = Vec::new();
    let mut partial_days = Vec::new();
    for date in span.iter_dates() {
        match hours_per_date.get(&date).map(BTreeSet::len) {
            None | Some(0) => missing_dates.push(date),
            Some(hours_found) if hours_found < 24 => {
                partial_days.push(PartialDay { date, hours_found });
            }
            Some(_) => {}
        }
    }

    let duplicate_keys = dataset
        .duplicate_keys()
        .into_iter()
        .map(|(key, count)| DuplicateKey { key, count })
        .collect();

    let mut out_of_range = Vec::new();
    let (mut forecast_gaps, mut consumption_gaps) = (0_usize, 0_usize);
    for record in dataset.iter() {
        if record.forecast_mw.is_none() {
            forecast_gaps += 1;
        }
        if record.consumption_mw.is_none() {
            consumption_gaps += 1;
        }
        for (field, value) in numeric_fields(record) {
            if !bounds.contains(value) {
                out_of_range.push(OutOfRange { key: record.key(), field, value });
            }
        }
    }
    let missing_values = [
        (Field::Forecast, forecast_gaps),
        (Field::Consumption, consumption_gaps),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(field, count)| MissingValues { field, count })
    .collect();

    let n_expected = span.n_dates();
    let n_present = n_expected - missing_dates.len();
    #[allow(clippy::cast_precision_loss)]
    let coverage_pct = round_to_tenth(100.0 * n_present as f64 / n_expected as f64);

    QualityReport {
        span,
        total_records: dataset.len(),
        missing_dates,
        partial_days,
        duplicate_keys,
        missing_values,
        out_of_range,
        coverage_pct,
    }
}

fn numeric_fields(record: &Record) -> impl Iterator<Item = (Field, f64)> {
    [
        record.forecast_mw.map(|value| (Field::Forecast, value)),
        record.consumption_mw.map(|value| (Field::Consumption, value)),
    ]
    .into_iter()
    .flatten()
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::core::record::HourRange;

    const BOUNDS: ValueBounds = ValueBounds { min: 0.0, max: 30000.0 };

    fn hour(index: u32) -> HourRange {
        let start = chrono::NaiveTime::from_hms_opt(index, 0, 0).unwrap();
        let end = chrono::NaiveTime::from_hms_opt((index + 1) % 24, 0, 0).unwrap();
        HourRange::new(start, end)
    }

    fn day(date: &str, n_hours: u32) -> Vec<Record> {
        let date: NaiveDate = date.parse().unwrap();
        (0..n_hours)
            .map(|index| Record {
                date,
                hour_range: hour(index),
                forecast_mw: Some(12000.0),
                consumption_mw: Some(11500.0),
            })
            .collect()
    }

    fn span(start: &str, end: &str) -> DateSpan {
        DateSpan::new(start.parse().unwrap(), end.parse().unwrap())
    }

    #[test]
    fn test_coverage_two_of_three_dates() {
        let mut records = day("2025-03-01", 24);
        records.extend(day("2025-03-03", 24));
        let report =
            check(&Dataset::from_records(records), span("2025-03-01", "2025-03-03"), BOUNDS);
        assert_relative_eq!(report.coverage_pct, 66.7);
        assert_eq!(report.missing_dates, vec!["2025-03-02".parse::<NaiveDate>().unwrap()]);
    }

    #[test]
    fn test_missing_vs_partial_are_distinct() {
        let report = check(
            &Dataset::from_records(day("2025-03-01", 18)),
            span("2025-03-01", "2025-03-02"),
            BOUNDS,
        );
        assert_eq!(report.missing_dates, vec!["2025-03-02".parse::<NaiveDate>().unwrap()]);
        assert_eq!(report.partial_days.len(), 1);
        assert_eq!(report.partial_days[0].date, "2025-03-01".parse::<NaiveDate>().unwrap());
        assert_eq!(report.partial_days[0].hours_found, 18);
    }

    #[test]
    fn test_full_day_is_neither_missing_nor_partial() {
        let report = check(
            &Dataset::from_records(day("2025-03-01", 24)),
            span("2025-03-01", "2025-03-01"),
            BOUNDS,
        );
        assert!(report.is_clean());
        assert_relative_eq!(report.coverage_pct, 100.0);
    }

    #[test]
    fn test_out_of_range_is_flagged_and_retained() {
        let mut records = day("2025-03-01", 24);
        records[5].consumption_mw = Some(-50.0);
        let dataset = Dataset::from_records(records);
        let report = check(&dataset, span("2025-03-01", "2025-03-01"), BOUNDS);

        assert_eq!(report.out_of_range.len(), 1);
        let finding = &report.out_of_range[0];
        assert_eq!(finding.key, dataset.iter().nth(5).unwrap().key());
        assert_relative_eq!(finding.value, -50.0);
        // The offending record stays in the dataset.
        assert_eq!(dataset.len(), 24);
    }

    #[test]
    fn test_duplicates_reported_for_out_of_band_edits() {
        let mut records = day("2025-03-01", 24);
        records.push(records[0]);
        let report = check(
            &Dataset::from_records(records),
            span("2025-03-01", "2025-03-01"),
            BOUNDS,
        );
        assert_eq!(report.duplicate_keys.len(), 1);
        assert_eq!(report.duplicate_keys[0].count, 2);
    }

    #[test]
    fn test_trailing_span() {
        let span = DateSpan::trailing(30, "2025-03-30".parse().unwrap());
        assert_eq!(span.start, "2025-03-01".parse::<NaiveDate>().unwrap());
        assert_eq!(span.n_dates(), 30);
    }

    #[test]
    fn test_trailing_span_clamps_instead_of_panicking() {
        let span = DateSpan::trailing(u64::MAX, "2025-03-30".parse().unwrap());
        assert_eq!(span.start, NaiveDate::MIN);
    }

    #[test]
    fn test_partial_day_counts_distinct_hours() {
        // 24 records, but a duplicate key means only 23 hour slots covered.
        let mut records = day("2025-03-01", 23);
        records.push(records[0]);
        let report = check(
            &Dataset::from_records(records),
            span("2025-03-01", "2025-03-01"),
            BOUNDS,
        );
        assert_eq!(report.partial_days.len(), 1);
        assert_eq!(report.partial_days[0].hours_found, 23);
        assert_eq!(report.duplicate_keys.len(), 1);
    }

    #[test]
    fn test_missing_values_counted_per_field() {
        let mut records = day("2025-03-01", 24);
        records[22].consumption_mw = None;
        records[23].consumption_mw = None;
        let report = check(
            &Dataset::from_records(records),
            span("2025-03-01", "2025-03-01"),
            BOUNDS,
        );
        assert_eq!(report.missing_values.len(), 1);
        assert!(matches!(report.missing_values[0].field, Field::Consumption));
        assert_eq!(report.missing_values[0].count, 2);
        assert!(!report.is_clean());
    }
}
