use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::{
    api::{PowerDataProvider, Region},
    cli::{CustomArgs, DailyArgs},
    core::{merge::merge, quality::DateSpan, record::RawRow},
    prelude::*,
    storage::Store,
    tables::build_merge_table,
};

#[instrument(skip_all)]
pub fn daily(args: &DailyArgs, provider: &impl PowerDataProvider) -> Result {
    let span = DateSpan::trailing(args.n_days, Local::now().date_naive());
    let dates: Vec<NaiveDate> = span.iter_dates().collect();
    run_scrape(&args.data.data_dir, args.fetch.region, &dates, provider)
}

#[instrument(skip_all)]
pub fn custom(args: &CustomArgs, provider: &impl PowerDataProvider) -> Result {
    let dates: Vec<NaiveDate> = match args.start_date {
        Some(start) => start.iter_days().take(usize::try_from(args.n_days)?).collect(),
        None => DateSpan::trailing(args.n_days, Local::now().date_naive()).iter_dates().collect(),
    };
    run_scrape(&args.data.data_dir, args.fetch.region, &dates, provider)
}

pub(crate) fn run_scrape(
    data_dir: &Path,
    region: Region,
    dates: &[NaiveDate],
    provider: &impl PowerDataProvider,
) -> Result {
    let store = Store::new(data_dir);
    let existing = store.read_master()?;
    let incoming = fetch_dates(provider, region, dates);
    if incoming.is_empty() {
        warn!("no new rows retrieved");
        return Ok(());
    }
    store.write_raw_snapshot(&incoming)?;

    let (merged, stats) = merge(existing, &incoming)?;
    store.write_master(&merged)?;
    info!(stats.inserted, stats.updated, stats.skipped, "merge completed");
    println!("{}", build_merge_table(&stats));
    Ok(())
}

/// Fetch every requested date, treating per-date failures as zero rows.
fn fetch_dates(
    provider: &impl PowerDataProvider,
    region: Region,
    dates: &[NaiveDate],
) -> Vec<RawRow> {
    let mut rows = Vec::new();
    for date in dates {
        match provider.fetch_day_with_retry(region, *date) {
            Ok(day_rows) => {
                if day_rows.is_empty() {
                    warn!(%date, "no rows published for this date");
                }
                rows.extend(day_rows);
            }
            Err(error) => {
                warn!(%date, error = format!("{error:#}"), "giving up on this date");
            }
        }
    }
    rows
}
