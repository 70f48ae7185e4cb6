//! Maintenance reprocessing of stored listings
//!
//! Re-extracts every stored listing with the current knowledge snapshot,
//! diffs against the stored result and upserts what changed. Without a
//! sport directory the batch runs data-parallel on rayon from a blocking
//! task, off the async workers; with one it runs
//! as a bounded async stream so the directory sees limited concurrency.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::data_quality::{DataQualityAnalyzer, DataQualityReport, StorageAssessment};
use super::extraction_service::{ExtractionOutcome, ExtractionPipeline};
use crate::domain::{DiffVerdict, ExtractionContext, ExtractionResult, RawListing};
use crate::infrastructure::config::MaintenanceConfig;
use crate::infrastructure::extraction_error::StoreError;
use crate::infrastructure::extraction_store::{ExtractionStore, StoredExtraction};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessReport {
    pub total: usize,
    /// Listings stored without any previous extraction
    pub first_extractions: usize,
    pub improved: usize,
    pub regressed: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub written: usize,
    pub failed_writes: usize,
    pub knowledge_fingerprint: String,
    pub duration_ms: u128,
    pub quality: Option<DataQualityReport>,
    pub assessment: Option<StorageAssessment>,
}

impl ReprocessReport {
    fn tally(&mut self, first: bool, verdict: Option<DiffVerdict>) {
        self.total += 1;
        if first {
            self.first_extractions += 1;
            return;
        }
        match verdict {
            Some(DiffVerdict::Improved) => self.improved += 1,
            Some(DiffVerdict::Regressed) => self.regressed += 1,
            Some(DiffVerdict::Changed) => self.changed += 1,
            Some(DiffVerdict::Unchanged) | None => self.unchanged += 1,
        }
    }
}

pub struct MaintenanceService {
    pipeline: Arc<ExtractionPipeline>,
    store: Arc<dyn ExtractionStore>,
    config: MaintenanceConfig,
}

impl MaintenanceService {
    pub fn new(pipeline: Arc<ExtractionPipeline>, store: Arc<dyn ExtractionStore>, config: MaintenanceConfig) -> Self {
        Self {
            pipeline,
            store,
            config,
        }
    }

    /// Extract a batch without touching the store; output order matches input
    pub fn extract_batch(&self, listings: &[RawListing]) -> Vec<ExtractionResult> {
        listings.par_iter().map(|l| self.pipeline.extract(l)).collect()
    }

    pub async fn reprocess_all(&self) -> Result<ReprocessReport, StoreError> {
        let started = Instant::now();
        let records = self.store.list().await?;
        let fingerprint = self.pipeline.knowledge().fingerprint().to_string();
        info!("Reprocessing {} stored listings (knowledge {})", records.len(), &fingerprint[..12]);

        let outcomes = self.run(&records).await;

        let mut report = ReprocessReport {
            knowledge_fingerprint: fingerprint.clone(),
            ..ReprocessReport::default()
        };
        for (record, outcome) in records.into_iter().zip(outcomes) {
            let first = record.knowledge_fingerprint.is_empty();
            let verdict = outcome.diff.as_ref().map(|d| d.verdict);
            report.tally(first, verdict);

            let stale = first || record.knowledge_fingerprint != fingerprint;
            if !stale && verdict == Some(DiffVerdict::Unchanged) {
                continue;
            }
            let stored = StoredExtraction {
                listing: record.listing,
                result: outcome.result,
                knowledge_fingerprint: fingerprint.clone(),
                updated_at: Utc::now(),
            };
            match self.store.upsert(stored).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    warn!("Failed to store re-extraction: {}", e);
                    report.failed_writes += 1;
                }
            }
        }

        let stored = self.store.list().await?;
        let analyzer = DataQualityAnalyzer::new(self.config.low_confidence_threshold);
        let pairs: Vec<_> = stored
            .iter()
            .map(|s| (s.listing.source_id.as_deref(), &s.result))
            .collect();
        let quality = analyzer.analyze(&pairs);
        report.assessment = Some(analyzer.assess_for_storage(&quality));
        report.quality = Some(quality);
        report.duration_ms = started.elapsed().as_millis();

        info!(
            "Reprocess finished: {} total, {} first, {} improved, {} regressed, {} changed, {} unchanged, {} written in {} ms",
            report.total,
            report.first_extractions,
            report.improved,
            report.regressed,
            report.changed,
            report.unchanged,
            report.written,
            report.duration_ms
        );
        Ok(report)
    }

    /// One outcome per record, in record order
    async fn run(&self, records: &[StoredExtraction]) -> Vec<ExtractionOutcome> {
        let contexts: Vec<ExtractionContext> = records
            .iter()
            .map(|r| {
                if r.knowledge_fingerprint.is_empty() {
                    ExtractionContext::default()
                } else {
                    ExtractionContext::with_prior(r.result.clone())
                }
            })
            .collect();

        if self.pipeline.has_directory() {
            let pipeline = &self.pipeline;
            stream::iter(records.iter().zip(&contexts))
                .map(|(record, context)| pipeline.extract_enriched(&record.listing, context))
                .buffered(self.config.max_concurrent_lookups.max(1))
                .collect()
                .await
        } else {
            let pipeline = Arc::clone(&self.pipeline);
            let listings: Vec<RawListing> = records.iter().map(|r| r.listing.clone()).collect();
            let batch = tokio::task::spawn_blocking(move || {
                listings
                    .par_iter()
                    .zip(contexts.par_iter())
                    .map(|(listing, context)| pipeline.extract_with_context(listing, context))
                    .collect::<Vec<_>>()
            });
            match batch.await {
                Ok(outcomes) => outcomes,
                Err(e) => match e.try_into_panic() {
                    Ok(payload) => std::panic::resume_unwind(payload),
                    Err(e) => {
                        warn!("Reprocess batch did not complete: {}", e);
                        Vec::new()
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::extraction_store::InMemoryExtractionStore;

    fn listing(id: &str, title: &str) -> RawListing {
        RawListing::new(title).with_source_id(id)
    }

    #[tokio::test]
    async fn test_second_pass_is_unchanged_and_writes_nothing() {
        let store = Arc::new(InMemoryExtractionStore::new());
        store
            .seed(vec![
                listing("1", "2021 Panini Prizm Ja'marr Chase Rookie Pink Prizm PSA 10"),
                listing("2", "2023 Bowman Chrome Paul Skenes Gold Refractor /50"),
            ])
            .await
            .unwrap();
        let pipeline = Arc::new(ExtractionPipeline::builtin().unwrap());
        let service = MaintenanceService::new(pipeline, store.clone(), MaintenanceConfig::default());

        let first = service.reprocess_all().await.unwrap();
        assert_eq!(first.first_extractions, 2);
        assert_eq!(first.written, 2);

        let second = service.reprocess_all().await.unwrap();
        assert_eq!(second.unchanged, 2);
        assert_eq!(second.written, 0);
        assert_eq!(second.quality.as_ref().map(|q| q.total_results), Some(2));

        let stored = store.get("2").await.unwrap().unwrap();
        assert_eq!(stored.result.print_run.as_deref(), Some("/50"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_offline_batch_leaves_the_runtime_free() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
        use std::time::Duration;

        let store = Arc::new(InMemoryExtractionStore::new());
        let listings = (0..2_000)
            .map(|i| listing(&i.to_string(), "2023 Bowman Chrome Paul Skenes Gold Refractor /50"))
            .collect();
        store.seed(listings).await.unwrap();
        let service = MaintenanceService::new(
            Arc::new(ExtractionPipeline::builtin().unwrap()),
            store,
            MaintenanceConfig::default(),
        );

        let done = AtomicBool::new(false);
        let ticks = AtomicUsize::new(0);
        let ticker = async {
            while !done.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(1)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        };
        let work = async {
            let report = service.reprocess_all().await.unwrap();
            done.store(true, Ordering::SeqCst);
            report
        };

        let ((), report) = tokio::join!(ticker, work);
        assert_eq!(report.total, 2_000);
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_batch_preserves_order() {
        let store = Arc::new(InMemoryExtractionStore::new());
        let pipeline = Arc::new(ExtractionPipeline::builtin().unwrap());
        let service = MaintenanceService::new(pipeline, store, MaintenanceConfig::default());
        let titles = ["2021 Panini Prizm", "", "2019 Topps Update Pete Alonso"];
        let listings: Vec<_> = titles.iter().map(|t| RawListing::new(*t)).collect();

        let results = service.extract_batch(&listings);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].year, Some(2021));
        assert_eq!(results[1], ExtractionResult::empty());
        assert_eq!(results[2].year, Some(2019));
    }
}
