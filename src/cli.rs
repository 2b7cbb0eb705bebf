mod check;
mod fill;
mod scrape;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

pub use self::{
    check::check,
    fill::fill,
    scrape::{custom, daily},
};
use crate::{api::Region, core::quality::ValueBounds};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scrape the most recent days and merge them into the master dataset.
    Daily(DailyArgs),

    /// Backfill dates that are missing within the trailing window.
    Fill(FillArgs),

    /// Scrape an explicit number of days, optionally from a given start date.
    Custom(CustomArgs),

    /// Run the quality checks and write the HTML report and JSON metrics.
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct DataArgs {
    /// Directory holding the master dataset, backups, and run state.
    #[clap(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Parser)]
pub struct FetchArgs {
    /// Price zone to fetch.
    #[clap(long, env = "REGION", value_enum, default_value = "se3")]
    pub region: Region,
}

#[derive(Parser)]
pub struct DailyArgs {
    #[clap(flatten)]
    pub data: DataArgs,

    #[clap(flatten)]
    pub fetch: FetchArgs,

    /// How many trailing days to scrape.
    #[clap(long, env = "DAILY_DAYS", default_value = "3")]
    pub n_days: u64,
}

#[derive(Parser)]
pub struct FillArgs {
    #[clap(flatten)]
    pub data: DataArgs,

    #[clap(flatten)]
    pub fetch: FetchArgs,

    /// Trailing window to inspect for gaps.
    #[clap(long, env = "FILL_WINDOW_DAYS", default_value = "30")]
    pub window_days: u64,

    /// Upper bound on dates fetched per run, to keep scheduled runs bounded.
    #[clap(long, env = "FILL_MAX_DATES", default_value = "5")]
    pub max_dates: usize,
}

#[derive(Parser)]
pub struct CustomArgs {
    #[clap(flatten)]
    pub data: DataArgs,

    #[clap(flatten)]
    pub fetch: FetchArgs,

    /// How many days to scrape.
    #[clap(long)]
    pub n_days: u64,

    /// First date to scrape; without it, the last `n_days` are scraped.
    #[clap(long)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Parser)]
pub struct CheckArgs {
    #[clap(flatten)]
    pub data: DataArgs,

    /// Trailing window the dataset is expected to cover.
    #[clap(long, env = "CHECK_WINDOW_DAYS", default_value = "30")]
    pub window_days: u64,

    /// Explicit span start; overrides the trailing window.
    #[clap(long)]
    pub start_date: Option<NaiveDate>,

    /// Explicit span end; defaults to today.
    #[clap(long)]
    pub end_date: Option<NaiveDate>,

    /// Directory the HTML report and JSON metrics are written to.
    #[clap(long, env = "REPORT_DIR", default_value = "reports")]
    pub report_dir: PathBuf,

    #[clap(flatten)]
    pub bounds: BoundsArgs,
}

#[derive(Copy, Clone, Parser)]
pub struct BoundsArgs {
    /// Lowest plausible megawatt figure.
    #[clap(long = "min-mw", env = "MIN_MW", default_value = "0", allow_hyphen_values = true)]
    pub min: f64,

    /// Highest plausible megawatt figure.
    #[clap(long = "max-mw", env = "MAX_MW", default_value = "30000")]
    pub max: f64,
}

impl From<BoundsArgs> for ValueBounds {
    fn from(args: BoundsArgs) -> Self {
        Self { min: args.min, max: args.max }
    }
}
