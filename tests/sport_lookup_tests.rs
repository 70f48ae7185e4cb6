//! Sport cascade with an external player directory attached
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use card_listing_extractor_lib::infrastructure::extraction_error::LookupError;
use card_listing_extractor_lib::infrastructure::parsing::SportStrategy;
use card_listing_extractor_lib::infrastructure::{PlayerSportDirectory, StaticSportDirectory};
use card_listing_extractor_lib::{ExtractionContext, ExtractionPipeline, RawListing, Sport};

// year-qualified Prizm entry does not cover 2020, so no catalog or keyword evidence
const TITLE: &str = "2020 Panini Prizm Anthony Edwards";

struct SlowDirectory;

#[async_trait]
impl PlayerSportDirectory for SlowDirectory {
    fn name(&self) -> &str {
        "slow"
    }

    async fn resolve_sport_for_player(&self, _name: &str) -> Result<Sport, LookupError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Sport::Basketball)
    }
}

struct BrokenDirectory;

#[async_trait]
impl PlayerSportDirectory for BrokenDirectory {
    fn name(&self) -> &str {
        "broken"
    }

    async fn resolve_sport_for_player(&self, _name: &str) -> Result<Sport, LookupError> {
        Err(LookupError::Status { status: 503 })
    }
}

fn pipeline_with(directory: Arc<dyn PlayerSportDirectory>) -> ExtractionPipeline {
    ExtractionPipeline::builtin()
        .unwrap()
        .with_directory(directory, Duration::from_millis(100))
}

#[tokio::test]
async fn directory_answer_fills_sport() {
    let directory = StaticSportDirectory::new().with_player("Anthony Edwards", Sport::Basketball);
    let pipeline = pipeline_with(Arc::new(directory));

    let outcome = pipeline
        .extract_enriched(&RawListing::new(TITLE), &ExtractionContext::default())
        .await;
    assert_eq!(outcome.result.player_name.as_deref(), Some("Anthony Edwards"));
    assert_eq!(outcome.result.sport, Sport::Basketball);
    assert_eq!(outcome.sport_strategy, SportStrategy::ExternalLookup);
}

#[tokio::test]
async fn slow_directory_degrades_only_the_sport() {
    let pipeline = pipeline_with(Arc::new(SlowDirectory));
    let listing = RawListing::new(TITLE);

    let outcome = pipeline.extract_enriched(&listing, &ExtractionContext::default()).await;
    assert_eq!(outcome.result.sport, Sport::Unknown);
    assert_eq!(outcome.sport_strategy, SportStrategy::Fallback);
    // everything else matches the offline extraction
    assert_eq!(outcome.result, pipeline.extract(&listing));
}

#[tokio::test]
async fn failing_directory_is_no_match() {
    let pipeline = pipeline_with(Arc::new(BrokenDirectory));
    let outcome = pipeline
        .extract_enriched(&RawListing::new(TITLE), &ExtractionContext::default())
        .await;
    assert_eq!(outcome.result.sport, Sport::Unknown);
    assert_eq!(outcome.result.year, Some(2020));
    assert_eq!(outcome.result.product.as_deref(), Some("Prizm"));
}

#[tokio::test]
async fn catalog_evidence_skips_the_directory() {
    let directory = StaticSportDirectory::new().with_player("Tobin Heath", Sport::Basketball);
    let pipeline = pipeline_with(Arc::new(directory));
    let outcome = pipeline
        .extract_enriched(
            &RawListing::new("2021 Topps Chrome UEFA Women's Champions League Tobin Heath /25"),
            &ExtractionContext::default(),
        )
        .await;
    assert_eq!(outcome.result.sport, Sport::Soccer);
    assert_eq!(outcome.sport_strategy, SportStrategy::Catalog);
}
