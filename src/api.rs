pub mod svk;

use std::{thread, time::Duration};

use chrono::NaiveDate;

use crate::{core::record::RawRow, prelude::*};

/// Electricity price/balancing zone of the Swedish grid.
#[derive(Copy, Clone, Eq, PartialEq, clap::ValueEnum, derive_more::Display)]
pub enum Region {
    #[display("SE1")]
    Se1,

    #[display("SE2")]
    Se2,

    #[display("SE3")]
    Se3,

    #[display("SE4")]
    Se4,
}

const MAX_ATTEMPTS: usize = 3;

/// Source of raw forecast/consumption rows for one region and date.
///
/// A day that yields no rows is not an error: the source simply has nothing
/// published yet. Implementations only fail on transport or decoding
/// problems.
pub trait PowerDataProvider {
    fn fetch_day(&self, region: Region, on: NaiveDate) -> Result<Vec<RawRow>>;

    /// [`Self::fetch_day`] with bounded doubling backoff on transient failures.
    fn fetch_day_with_retry(&self, region: Region, on: NaiveDate) -> Result<Vec<RawRow>> {
        let mut backoff = Duration::from_secs(1);
        for attempt in 1..MAX_ATTEMPTS {
            match self.fetch_day(region, on) {
                Ok(rows) => return Ok(rows),
                Err(error) => {
                    warn!(
                        attempt,
                        ?backoff,
                        error = format!("{error:#}"),
                        "fetch failed, retrying",
                    );
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }
        self.fetch_day(region, on)
            .with_context(|| format!("fetching {region} {on} failed after {MAX_ATTEMPTS} attempts"))
    }
}
