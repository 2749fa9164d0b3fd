mod cli;
mod config;
mod logging;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use harvest_logging::{harvest_error, harvest_info};
use harvester_core::{DateWindow, Harvester, ListingId, Pacer, Strategy};
use harvester_engine::HttpPageFetcher;

use crate::cli::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::initialize(args.log.into(), args.log_level());

    run(&args).inspect_err(|err| harvest_error!("Harvest failed: {:#}", err))
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = config::load(&args.config)?;
    let window = DateWindow::parse(&args.start, &args.end)?;
    let listing = ListingId::new(args.listing.as_str());

    let mut harvest = config.harvest.clone();
    if args.linear {
        harvest.strategy = Strategy::Linear;
    }

    let fetcher = HttpPageFetcher::new(config.fetch.settings(), config.source.clone())
        .context("could not set up the page fetcher")?;
    let pacer = Pacer::new(config.delay);
    let report = Harvester::new(&fetcher, &pacer, harvest)
        .harvest_window(&listing, window)
        .with_context(|| format!("harvesting {listing} for {window}"))?;

    let dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let path = output::write_report(&dir, &listing, window, &report, Utc::now())
        .with_context(|| format!("could not write results to {}", dir.display()))?;

    harvest_info!("Wrote {} records to {:?}", report.records.len(), path);
    println!(
        "{}: {} records ({}, {} pages fetched) -> {}",
        listing,
        report.records.len(),
        report.outcome,
        report.pages_fetched,
        path.display()
    );
    Ok(())
}
