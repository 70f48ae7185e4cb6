//! Extraction store interface
//!
//! Persistence of extraction results keyed by listing source id. The storage
//! engine itself lives outside this crate; the in-memory store backs tests
//! and one-shot maintenance runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::{ExtractionResult, RawListing};
use crate::infrastructure::extraction_error::StoreError;

/// A listing with its latest stored extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredExtraction {
    pub listing: RawListing,
    pub result: ExtractionResult,
    pub knowledge_fingerprint: String,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ExtractionStore: Send + Sync {
    /// Insert or replace; the last write wins
    async fn upsert(&self, record: StoredExtraction) -> Result<(), StoreError>;

    async fn get(&self, source_id: &str) -> Result<Option<StoredExtraction>, StoreError>;

    /// Every stored record, ordered by source id
    async fn list(&self) -> Result<Vec<StoredExtraction>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list().await?.len())
    }
}

fn key_of(listing: &RawListing) -> Result<&str, StoreError> {
    listing
        .source_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| StoreError::MissingKey(listing.title.clone()))
}

#[derive(Debug, Default)]
pub struct InMemoryExtractionStore {
    records: RwLock<HashMap<String, StoredExtraction>>,
}

impl InMemoryExtractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with listings that have no extraction yet
    pub async fn seed(&self, listings: Vec<RawListing>) -> Result<(), StoreError> {
        for listing in listings {
            self.upsert(StoredExtraction {
                listing,
                result: ExtractionResult::empty(),
                knowledge_fingerprint: String::new(),
                updated_at: Utc::now(),
            })
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ExtractionStore for InMemoryExtractionStore {
    async fn upsert(&self, record: StoredExtraction) -> Result<(), StoreError> {
        let key = key_of(&record.listing)?.to_string();
        self.records.write().await.insert(key, record);
        Ok(())
    }

    async fn get(&self, source_id: &str) -> Result<Option<StoredExtraction>, StoreError> {
        Ok(self.records.read().await.get(source_id).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredExtraction>, StoreError> {
        let mut records: Vec<StoredExtraction> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.listing.source_id.cmp(&b.listing.source_id));
        Ok(records)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}
