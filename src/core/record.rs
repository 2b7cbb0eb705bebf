use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};

use crate::prelude::*;

/// One-hour settlement period within a day, `"HH:MM - HH:MM"` on the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, derive_more::Display)]
#[display("{} - {}", start.format("%H:%M"), end.format("%H:%M"))]
#[must_use]
pub struct HourRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl HourRange {
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

impl FromStr for HourRange {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        let (start, end) = label
            .split_once('-')
            .with_context(|| format!("missing hour range separator in `{label}`"))?;
        Ok(Self {
            start: NaiveTime::parse_from_str(start.trim(), "%H:%M")
                .with_context(|| format!("invalid start time in `{label}`"))?,
            end: NaiveTime::parse_from_str(end.trim(), "%H:%M")
                .with_context(|| format!("invalid end time in `{label}`"))?,
        })
    }
}

/// Uniqueness key of a [`Record`]: no two records in a dataset may share it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, derive_more::Display)]
#[display("{date} {hour_range}")]
#[must_use]
pub struct RecordKey {
    pub date: NaiveDate,
    pub hour_range: HourRange,
}

impl Serialize for HourRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for RecordKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One observed hour of grid data in canonical form.
///
/// A `None` forecast or consumption means the source had no figure for that
/// hour. Zero is a legitimate reading and is never conflated with missing.
#[derive(Copy, Clone, Debug, PartialEq)]
#[must_use]
pub struct Record {
    pub date: NaiveDate,
    pub hour_range: HourRange,
    pub forecast_mw: Option<f64>,
    pub consumption_mw: Option<f64>,
}

impl Record {
    pub const fn key(&self) -> RecordKey {
        RecordKey { date: self.date, hour_range: self.hour_range }
    }

    /// Sort key: the date combined with the start of the hour range.
    #[must_use]
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.hour_range.start)
    }

    /// Fill missing fields from `other` without touching populated ones.
    /// Returns whether anything changed.
    pub fn fill_from(&mut self, other: &Self) -> bool {
        let mut changed = false;
        if self.forecast_mw.is_none() && other.forecast_mw.is_some() {
            self.forecast_mw = other.forecast_mw;
            changed = true;
        }
        if self.consumption_mw.is_none() && other.consumption_mw.is_some() {
            self.consumption_mw = other.consumption_mw;
            changed = true;
        }
        changed
    }
}

/// Unnormalized row as produced by a fetch adapter: the hour label and both
/// figures are still locale-formatted text.
#[derive(Clone)]
#[must_use]
pub struct RawRow {
    pub date: NaiveDate,
    pub hour: String,
    pub forecast: String,
    pub consumption: String,
}

impl RawRow {
    /// Convert into canonical form.
    ///
    /// Absent figures become `None`; a non-empty figure that does not parse
    /// as a number makes the whole row invalid.
    pub fn normalize(&self) -> Result<Record> {
        Ok(Record {
            date: self.date,
            hour_range: self.hour.parse()?,
            forecast_mw: parse_megawatts(&self.forecast)
                .with_context(|| format!("bad forecast for {} {}", self.date, self.hour))?,
            consumption_mw: parse_megawatts(&self.consumption)
                .with_context(|| format!("bad consumption for {} {}", self.date, self.hour))?,
        })
    }
}

/// Parse a locale-formatted megawatt figure.
///
/// The source mixes Swedish formatting (`12 843,4`, non-breaking group
/// separators) with plain period decimals. When both `,` and `.` occur, the
/// rightmost one is taken as the decimal separator.
pub fn parse_megawatts(text: &str) -> Result<Option<f64>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || cleaned == "-" || cleaned == "–" {
        return Ok(None);
    }
    let cleaned = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(period)) if comma > period => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    let value = cleaned
        .parse::<f64>()
        .with_context(|| format!("unparseable megawatt figure `{text}`"))?;
    ensure!(value.is_finite(), "non-finite megawatt figure `{text}`");
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn unwrap_value(text: &str) -> f64 {
        parse_megawatts(text).unwrap().unwrap()
    }

    #[test]
    fn test_parse_megawatts_locales() {
        assert_relative_eq!(unwrap_value("12843.4"), 12843.4);
        assert_relative_eq!(unwrap_value("12843,4"), 12843.4);
        assert_relative_eq!(unwrap_value("12\u{a0}843,4"), 12843.4);
        assert_relative_eq!(unwrap_value("12.843,4"), 12843.4);
        assert_relative_eq!(unwrap_value("12,843.4"), 12843.4);
        assert_relative_eq!(unwrap_value("0"), 0.0);
    }

    #[test]
    fn test_parse_megawatts_absent() {
        assert_eq!(parse_megawatts("").unwrap(), None);
        assert_eq!(parse_megawatts("  ").unwrap(), None);
        assert_eq!(parse_megawatts("-").unwrap(), None);
    }

    #[test]
    fn test_parse_megawatts_garbage() {
        assert!(parse_megawatts("n/a").is_err());
        assert!(parse_megawatts("12x4").is_err());
    }

    #[test]
    fn test_hour_range_round_trip() {
        let range: HourRange = "14:00 - 15:00".parse().unwrap();
        assert_eq!(range.to_string(), "14:00 - 15:00");
        assert!("14:00".parse::<HourRange>().is_err());
    }

    #[test]
    fn test_normalize_keeps_zero_distinct_from_missing() {
        let row = RawRow {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            hour: "03:00 - 04:00".to_string(),
            forecast: "0".to_string(),
            consumption: String::new(),
        };
        let record = row.normalize().unwrap();
        assert_eq!(record.forecast_mw, Some(0.0));
        assert_eq!(record.consumption_mw, None);
    }
}
