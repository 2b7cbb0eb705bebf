#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod fmt;
mod prelude;
mod report;
mod storage;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    api::svk,
    cli::{Args, Command},
    prelude::*,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Daily(args) => cli::daily(&args, &svk::Client::new())?,
        Command::Fill(args) => cli::fill(&args, &svk::Client::new())?,
        Command::Custom(args) => cli::custom(&args, &svk::Client::new())?,
        Command::Check(args) => cli::check(&args)?,
    }

    info!("done!");
    Ok(())
}
