//! [Svenska kraftnät control-room](https://www.svk.se/om-kraftsystemet/kontrollrummet/) client.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use ureq::Agent;

use crate::{
    api::{PowerDataProvider, Region},
    core::record::RawRow,
    prelude::*,
};

const BASE_URL: &str = "https://www.svk.se/services/controlroom/v2/situation";

pub struct Client {
    client: Agent,
}

impl Client {
    #[must_use]
    pub fn new() -> Self {
        let client =
            Agent::config_builder().timeout_global(Some(Duration::from_secs(10))).build().into();
        Self { client }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerDataProvider for Client {
    #[instrument(fields(%region, %on), skip_all)]
    fn fetch_day(&self, region: Region, on: NaiveDate) -> Result<Vec<RawRow>> {
        info!("fetching…");
        let response = self
            .client
            .get(BASE_URL)
            .query("date", on.format("%Y-%m-%d").to_string())
            .query("biddingArea", region.to_string())
            .call()
            .context("request failed")?
            .body_mut()
            .read_json::<Response>()
            .context("failed to decode the response")?;
        let rows = response
            .data
            .into_iter()
            .map(|entry| RawRow {
                date: on,
                hour: entry.hour,
                forecast: entry.forecast.unwrap_or_default(),
                consumption: entry.consumption.unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        info!(n_rows = rows.len(), "fetched");
        Ok(rows)
    }
}

#[derive(Deserialize)]
struct Response {
    #[serde(rename = "Data", default)]
    data: Vec<Entry>,
}

/// One hour-slot as published by the control room; figures are
/// locale-formatted text and may be absent for future hours.
#[derive(Deserialize)]
struct Entry {
    #[serde(rename = "Timme")]
    hour: String,

    #[serde(rename = "Prognos")]
    forecast: Option<String>,

    #[serde(rename = "Forbrukning")]
    consumption: Option<String>,
}
