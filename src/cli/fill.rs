use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};

use crate::{
    api::PowerDataProvider,
    cli::{FillArgs, scrape::run_scrape},
    core::quality::DateSpan,
    prelude::*,
    storage::Store,
};

/// Gap-fill run: scrape dates that the master dataset is missing within the
/// trailing window, a bounded number of them per run.
#[instrument(skip_all)]
pub fn fill(args: &FillArgs, provider: &impl PowerDataProvider) -> Result {
    let existing = Store::new(&args.data.data_dir).read_master()?;
    let span = DateSpan::trailing(args.window_days, Local::now().date_naive());
    let present: BTreeSet<NaiveDate> = existing.dates().into_iter().collect();
    let missing: Vec<NaiveDate> =
        span.iter_dates().filter(|date| !present.contains(date)).collect();

    if missing.is_empty() {
        info!(%span, "no missing dates");
        return Ok(());
    }
    warn!(n_missing = missing.len(), %span, "found missing dates");

    let dates = &missing[..missing.len().min(args.max_dates)];
    run_scrape(&args.data.data_dir, args.fetch.region, dates, provider)
}
