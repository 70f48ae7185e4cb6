//! Extraction throughput: single titles and a rayon-parallel batch

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use card_listing_extractor_lib::application::{ExtractionPipeline, MaintenanceService};
use card_listing_extractor_lib::domain::RawListing;
use card_listing_extractor_lib::infrastructure::config::MaintenanceConfig;
use card_listing_extractor_lib::infrastructure::extraction_store::InMemoryExtractionStore;

const TITLES: &[&str] = &[
    "2021 Panini Prizm- Ja'marr Chase- Rookie Pink Prizm- PSA 10 💎",
    "2021 Topps Chrome UEFA Women's Champions League Tobin Heath /25 PSA 10",
    "2024 Panini Prizm Anthony Edwards Bulls #123 PSA 10",
    "2023 Bowman Chrome Paul Skenes Gold Refractor /50 L@@K HOT",
    "2019-20 Upper Deck Young Guns Cale Makar #201",
    "Pokemon Base Set 1st Edition Charizard Holo BGS 9.5",
    "2020 Topps Chrome Superfractor Luis Robert 1/1",
];

fn single_title(c: &mut Criterion) {
    let pipeline = ExtractionPipeline::builtin().unwrap();
    let mut group = c.benchmark_group("extract");
    for (i, title) in TITLES.iter().enumerate() {
        let listing = RawListing::new(*title);
        group.bench_with_input(BenchmarkId::from_parameter(i), &listing, |b, listing| {
            b.iter(|| black_box(pipeline.extract(black_box(listing))));
        });
    }
    group.finish();
}

fn parallel_batch(c: &mut Criterion) {
    let pipeline = Arc::new(ExtractionPipeline::builtin().unwrap());
    let service = MaintenanceService::new(
        pipeline,
        Arc::new(InMemoryExtractionStore::new()),
        MaintenanceConfig::default(),
    );
    let listings: Vec<RawListing> = TITLES
        .iter()
        .cycle()
        .take(1_000)
        .map(|t| RawListing::new(*t))
        .collect();

    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(listings.len() as u64));
    group.bench_function("rayon_1000", |b| {
        b.iter(|| black_box(service.extract_batch(black_box(&listings))));
    });
    group.finish();
}

criterion_group!(benches, single_title, parallel_batch);
criterion_main!(benches);
