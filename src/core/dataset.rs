use chrono::NaiveDate;
use itertools::Itertools;

use crate::core::record::{Record, RecordKey};

/// Ordered collection of records, sorted by timestamp ascending.
///
/// The collection itself does not enforce key uniqueness; the merger does,
/// and [`Dataset::duplicate_keys`] exists to verify it after the fact.
#[derive(Default, derive_more::IntoIterator)]
#[must_use]
pub struct Dataset(Vec<Record>);

impl Dataset {
    /// Build from unordered records, restoring the sort invariant.
    pub fn from_records(mut records: Vec<Record>) -> Self {
        records.sort_by_key(Record::timestamp);
        Self(records)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.0.iter()
    }

    /// Distinct dates present, ascending.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.0.iter().map(|record| record.date).dedup().collect()
    }

    /// First and last date present.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.0.first()?.date, self.0.last()?.date))
    }

    /// Keys that occur more than once, with their multiplicities.
    #[must_use]
    pub fn duplicate_keys(&self) -> Vec<(RecordKey, usize)> {
        self.0
            .iter()
            .map(Record::key)
            .sorted()
            .dedup_with_count()
            .filter(|(count, _)| *count > 1)
            .map(|(count, key)| (key, count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::core::record::HourRange;

    pub fn record(date: &str, hour: &str) -> Record {
        Record {
            date: date.parse().unwrap(),
            hour_range: hour.parse::<HourRange>().unwrap(),
            forecast_mw: None,
            consumption_mw: None,
        }
    }

    #[test]
    fn test_from_records_sorts_by_timestamp() {
        let dataset = Dataset::from_records(vec![
            record("2025-03-02", "00:00 - 01:00"),
            record("2025-03-01", "23:00 - 00:00"),
            record("2025-03-01", "05:00 - 06:00"),
        ]);
        let timestamps: Vec<_> = dataset.iter().map(Record::timestamp).collect();
        assert!(timestamps.is_sorted());
        assert_eq!(
            dataset.date_range(),
            Some((
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
            ))
        );
    }

    #[test]
    fn test_duplicate_keys() {
        let dataset = Dataset::from_records(vec![
            record("2025-03-01", "05:00 - 06:00"),
            record("2025-03-01", "05:00 - 06:00"),
            record("2025-03-01", "06:00 - 07:00"),
        ]);
        let duplicates = dataset.duplicate_keys();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, record("2025-03-01", "05:00 - 06:00").key());
        assert_eq!(duplicates[0].1, 2);
    }
}
