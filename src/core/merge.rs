use std::collections::{BTreeMap, btree_map::Entry};

use crate::{
    core::{
        dataset::Dataset,
        record::{RawRow, Record, RecordKey},
    },
    prelude::*,
};

/// Outcome counters of one merge: how many incoming rows opened a new key,
/// filled a missing field on an existing key, or were rejected as malformed.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
#[must_use]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Merge freshly fetched rows into the existing dataset.
///
/// First-write-wins: a key already present keeps its values, except that an
/// incoming row may fill fields the existing record is missing. Malformed
/// rows are skipped individually and never abort the run. The uniqueness
/// invariant is reverified on the result; a violation there is a logic
/// defect, so it is a hard error rather than a report entry.
pub fn merge(existing: Dataset, incoming: &[RawRow]) -> Result<(Dataset, MergeStats)> {
    let mut stats = MergeStats::default();
    let mut by_key: BTreeMap<RecordKey, Record> =
        existing.into_iter().map(|record| (record.key(), record)).collect();

    for row in incoming {
        let record = match row.normalize() {
            Ok(record) => record,
            Err(error) => {
                warn!(
                    date = %row.date,
                    hour = %row.hour,
                    error = format!("{error:#}"),
                    "skipping malformed row",
                );
                stats.skipped += 1;
                continue;
            }
        };
        match by_key.entry(record.key()) {
            Entry::Vacant(entry) => {
                entry.insert(record);
                stats.inserted += 1;
            }
            Entry::Occupied(mut entry) => {
                if entry.get_mut().fill_from(&record) {
                    stats.updated += 1;
                }
            }
        }
    }

    let merged = Dataset::from_records(by_key.into_values().collect());
    if let Some((key, count)) = merged.duplicate_keys().first() {
        bail!("uniqueness invariant violated after merge: `{key}` occurs {count} times");
    }
    Ok((merged, stats))
}
