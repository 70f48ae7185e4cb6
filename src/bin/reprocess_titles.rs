//! Reprocess listing titles from a file (or stdin) and print one JSON
//! record per line.
//!
//! Usage: `reprocess_titles [--config PATH] [--report] [FILE]`
//!
//! Input lines are either a bare title or `source_id<TAB>title`. With
//! `--report` the batch runs through the maintenance service and a
//! data-quality summary is written to stderr.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use card_listing_extractor_lib::application::{ExtractionPipeline, MaintenanceService};
use card_listing_extractor_lib::domain::{ExtractionContext, ExtractionResult, RawListing};
use card_listing_extractor_lib::infrastructure::config::AppConfig;
use card_listing_extractor_lib::infrastructure::extraction_store::{ExtractionStore, InMemoryExtractionStore};
use card_listing_extractor_lib::infrastructure::logging::{init_logging_with_config, log_system_info};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    report: bool,
    input: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--report" => args.report = true,
            "-h" | "--help" => {
                eprintln!("usage: reprocess_titles [--config PATH] [--report] [FILE]");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => args.input = Some(path.into()),
        }
    }
    Ok(args)
}

fn read_listings(input: Option<&PathBuf>) -> Result<Vec<RawListing>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut listings = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let listing = match line.split_once('\t') {
            Some((id, title)) => RawListing::new(title).with_source_id(id.trim()),
            None => RawListing::new(line).with_source_id(format!("line-{}", n + 1)),
        };
        listings.push(listing);
    }
    Ok(listings)
}

/// Stored results in the order their ids first appear in the input. A
/// repeated id is printed once, with the last write.
async fn in_input_order(
    store: &dyn ExtractionStore,
    ids: &[String],
) -> Result<Vec<(RawListing, ExtractionResult)>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let stored = store
            .get(id)
            .await?
            .with_context(|| format!("Listing {id} missing from the store"))?;
        out.push((stored.listing, stored.result));
    }
    Ok(out)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputRecord<'a> {
    source_id: Option<&'a str>,
    title: &'a str,
    result: &'a ExtractionResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging_with_config(&config.logging)?;
    log_system_info();

    let listings = read_listings(args.input.as_ref())?;
    info!("Read {} listings", listings.len());
    let pipeline = Arc::new(ExtractionPipeline::from_config(&config).await?);

    let results: Vec<(RawListing, ExtractionResult)> = if args.report {
        let ids: Vec<String> = listings.iter().filter_map(|l| l.source_id.clone()).collect();
        let store = Arc::new(InMemoryExtractionStore::new());
        store.seed(listings).await?;
        let service = MaintenanceService::new(Arc::clone(&pipeline), store.clone(), config.maintenance.clone());
        let report = service.reprocess_all().await?;
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
        in_input_order(store.as_ref(), &ids).await?
    } else {
        let mut out = Vec::with_capacity(listings.len());
        for listing in listings {
            let result = if pipeline.has_directory() {
                pipeline.extract_enriched(&listing, &ExtractionContext::default()).await.result
            } else {
                pipeline.extract(&listing)
            };
            out.push((listing, result));
        }
        out
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for (listing, result) in &results {
        let record = OutputRecord {
            source_id: listing.source_id.as_deref(),
            title: &listing.title,
            result,
        };
        writeln!(handle, "{}", serde_json::to_string(&record)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_listing_extractor_lib::infrastructure::config::MaintenanceConfig;

    #[tokio::test]
    async fn test_report_output_follows_input_order() {
        let listings = vec![
            RawListing::new("2023 Bowman Chrome Paul Skenes Gold Refractor /50").with_source_id("line-2"),
            RawListing::new("2021 Panini Prizm Ja'marr Chase Rookie").with_source_id("line-10"),
            RawListing::new("2023 PSA 10").with_source_id("line-1"),
            RawListing::new("2023 PSA 10").with_source_id("line-2"),
        ];
        let ids: Vec<String> = listings.iter().filter_map(|l| l.source_id.clone()).collect();
        let store = Arc::new(InMemoryExtractionStore::new());
        store.seed(listings).await.unwrap();
        let service = MaintenanceService::new(
            Arc::new(ExtractionPipeline::builtin().unwrap()),
            store.clone(),
            MaintenanceConfig::default(),
        );
        service.reprocess_all().await.unwrap();

        let out = in_input_order(store.as_ref(), &ids).await.unwrap();
        let order: Vec<_> = out.iter().map(|(l, _)| l.source_id.as_deref().unwrap()).collect();
        assert_eq!(order, ["line-2", "line-10", "line-1"]);
        assert_eq!(out[0].0.title, "2023 PSA 10");
    }
}
