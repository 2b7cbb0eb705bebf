use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local, NaiveDate};
use csv::{ReaderBuilder, WriterBuilder};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{
        dataset::Dataset,
        record::{RawRow, Record},
    },
    prelude::*,
};

/// Header of the master file. Column order and wording are a compatibility
/// contract with downstream consumers; do not touch.
const HEADER: [&str; 5] = ["Date", "Timme", "Prognos (MW)", "Förbrukning (MW)", "DateTime"];

const N_KEPT_BACKUPS: usize = 5;

/// On-disk layout under one data directory: the master CSV, rotating
/// backups, and the run-state JSON.
pub struct Store {
    data_dir: PathBuf,
    master_file: PathBuf,
    backup_dir: PathBuf,
    state_file: PathBuf,
}

impl Store {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            master_file: data_dir.join("svk_master_data.csv"),
            backup_dir: data_dir.join("backups"),
            state_file: data_dir.join("scraper_state.json"),
        }
    }

    /// Load the master dataset, or an empty one on the first run.
    #[instrument(skip_all)]
    pub fn read_master(&self) -> Result<Dataset> {
        if !self.master_file.is_file() {
            info!("no existing master file, starting fresh");
            return Ok(Dataset::default());
        }
        let dataset = read_dataset(&self.master_file)
            .with_context(|| format!("failed to read `{}`", self.master_file.display()))?;
        info!(n_records = dataset.len(), "loaded the master dataset");
        Ok(dataset)
    }

    /// Persist the merged dataset: back up the current master, write the new
    /// one to a temporary file, and atomically swap it in. A failed write
    /// leaves the previous master intact.
    #[instrument(skip_all)]
    pub fn write_master(&self, dataset: &Dataset) -> Result {
        if let Some(data_dir) = self.master_file.parent() {
            fs::create_dir_all(data_dir)?;
        }
        self.back_up_master()?;
        write_dataset(&self.master_file, dataset)
            .with_context(|| format!("failed to write `{}`", self.master_file.display()))?;
        info!(n_records = dataset.len(), "saved the master dataset");
        self.write_state(dataset)?;
        Ok(())
    }

    /// Keep the freshly scraped rows as a timestamped audit snapshot next
    /// to the master, before any merging touches them.
    #[instrument(skip_all)]
    pub fn write_raw_snapshot(&self, rows: &[RawRow]) -> Result {
        fs::create_dir_all(&self.data_dir)?;
        let path =
            self.data_dir.join(format!("raw_{}.csv", Local::now().format("%Y%m%d_%H%M%S")));
        let mut writer = WriterBuilder::new()
            .from_path(&path)
            .with_context(|| format!("failed to create `{}`", path.display()))?;
        writer.write_record(["Date", "Timme", "Prognos (MW)", "Förbrukning (MW)"])?;
        for row in rows {
            writer.write_record([
                row.date.format("%Y-%m-%d").to_string(),
                row.hour.clone(),
                row.forecast.clone(),
                row.consumption.clone(),
            ])?;
        }
        writer.flush()?;
        debug!(path = %path.display(), n_rows = rows.len(), "wrote the raw snapshot");
        Ok(())
    }

    fn back_up_master(&self) -> Result {
        if !self.master_file.is_file() {
            return Ok(());
        }
        fs::create_dir_all(&self.backup_dir)?;
        let backup_file =
            self.backup_dir.join(format!("backup_{}.csv", Local::now().format("%Y%m%d_%H%M%S")));
        fs::copy(&self.master_file, &backup_file)?;
        debug!(backup_file = %backup_file.display(), "backed up the master file");

        // Backup names sort chronologically, so drop everything but the
        // newest five.
        let backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map_ok(|entry| {
                let path = entry.path();
                path.file_name()?.to_str()?.starts_with("backup_").then_some(path)
            })
            .try_collect()?;
        for stale in backups.iter().sorted().rev().skip(N_KEPT_BACKUPS) {
            fs::remove_file(stale)?;
        }
        Ok(())
    }

    fn write_state(&self, dataset: &Dataset) -> Result {
        let state = RunState {
            last_update: Local::now(),
            total_records: dataset.len(),
            date_range: dataset.date_range().map(|(start, end)| StateDateRange { start, end }),
        };
        fs::write(&self.state_file, serde_json::to_vec_pretty(&state)?)
            .with_context(|| format!("failed to write `{}`", self.state_file.display()))
    }
}

/// Monitoring snapshot written after each successful scrape.
#[derive(Serialize)]
struct RunState {
    last_update: DateTime<Local>,
    total_records: usize,
    date_range: Option<StateDateRange>,
}

#[derive(Serialize)]
struct StateDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let contents = fs::read_to_string(path)?;
    let contents = contents.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(contents.as_bytes());
    {
        let header = reader.headers().context("failed to read the header")?;
        ensure!(header.iter().eq(HEADER), "unexpected header: {header:?}");
    }
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(parse_row(&row).with_context(|| format!("malformed row {row:?}"))?);
    }
    Ok(Dataset::from_records(records))
}

fn parse_row(row: &csv::StringRecord) -> Result<Record> {
    ensure!(row.len() == HEADER.len(), "expected {} fields, got {}", HEADER.len(), row.len());
    Ok(Record {
        date: row[0].parse()?,
        hour_range: row[1].parse()?,
        forecast_mw: crate::core::record::parse_megawatts(&row[2])?,
        consumption_mw: crate::core::record::parse_megawatts(&row[3])?,
        // Field 4 is the derived `DateTime` column; recomputed on write.
    })
}

pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result {
    let temp_path = path.with_extension("csv.tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        // Downstream consumers expect `utf-8-sig`.
        file.write_all("\u{feff}".as_bytes())?;
        let mut writer = WriterBuilder::new().from_writer(file);
        writer.write_record(HEADER)?;
        for record in dataset.iter() {
            writer.write_record([
                record.date.format("%Y-%m-%d").to_string(),
                record.hour_range.to_string(),
                record.forecast_mw.map(|value| value.to_string()).unwrap_or_default(),
                record.consumption_mw.map(|value| value.to_string()).unwrap_or_default(),
                record.timestamp().format("%Y-%m-%d %H:%M").to_string(),
            ])?;
        }
        writer.flush()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::core::record::HourRange;

    fn temp_data_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kraftnat-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_dataset() -> Dataset {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        Dataset::from_records(vec![
            Record {
                date,
                hour_range: "00:00 - 01:00".parse::<HourRange>().unwrap(),
                forecast_mw: Some(12843.4),
                consumption_mw: Some(12757.0),
            },
            Record {
                date,
                hour_range: "01:00 - 02:00".parse::<HourRange>().unwrap(),
                forecast_mw: Some(12600.25),
                consumption_mw: None,
            },
        ])
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let dir = temp_data_dir("round-trip");
        let path = dir.join("svk_master_data.csv");
        let dataset = sample_dataset();

        write_dataset(&path, &dataset).unwrap();
        let restored = read_dataset(&path).unwrap();

        let original: Vec<Record> = dataset.iter().copied().collect();
        let restored: Vec<Record> = restored.iter().copied().collect();
        assert_eq!(original, restored);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_written_file_has_bom_and_exact_header() {
        let dir = temp_data_dir("header");
        let path = dir.join("svk_master_data.csv");
        write_dataset(&path, &sample_dataset()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with('\u{feff}'));
        let first_line = contents.trim_start_matches('\u{feff}').lines().next().unwrap();
        assert_eq!(first_line, "Date,Timme,Prognos (MW),Förbrukning (MW),DateTime");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_master_reads_as_empty() {
        let dir = temp_data_dir("missing");
        let store = Store::new(&dir);
        assert!(store.read_master().unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_raw_snapshot_written_before_merge() {
        let dir = temp_data_dir("raw-snapshot");
        let store = Store::new(&dir);
        store
            .write_raw_snapshot(&[RawRow {
                date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                hour: "00:00 - 01:00".to_string(),
                forecast: "12 843,4".to_string(),
                consumption: String::new(),
            }])
            .unwrap();

        let snapshots: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|entry| {
                let name = entry.unwrap().file_name().into_string().unwrap();
                name.starts_with("raw_").then_some(name)
            })
            .collect();
        assert_eq!(snapshots.len(), 1);
        let contents = fs::read_to_string(dir.join(&snapshots[0])).unwrap();
        assert!(contents.starts_with("Date,Timme,Prognos (MW),Förbrukning (MW)"));
        assert!(contents.contains("2025-03-01,00:00 - 01:00,\"12 843,4\","));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_store_write_then_read_and_state() {
        let dir = temp_data_dir("store");
        let store = Store::new(&dir);
        store.write_master(&sample_dataset()).unwrap();

        assert_eq!(store.read_master().unwrap().len(), 2);
        let state: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("scraper_state.json")).unwrap())
                .unwrap();
        assert_eq!(state["total_records"], 2);
        assert_eq!(state["date_range"]["start"], "2025-03-01");

        // No leftover temporary file after the atomic swap.
        assert!(!dir.join("svk_master_data.csv.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
