//! Listing input types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extraction::ExtractionResult;

/// Immutable marketplace listing as collected. Never mutated downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

impl RawListing {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_id: None,
            collected_at: None,
        }
    }

    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    #[must_use]
    pub const fn with_collected_at(mut self, collected_at: DateTime<Utc>) -> Self {
        self.collected_at = Some(collected_at);
        self
    }

    /// A title with no visible characters is malformed input
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.chars().all(|c| c.is_whitespace() || c.is_control())
    }
}

/// Optional context supplied by maintenance/reprocessing jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionContext {
    /// Player name believed to be on the card. Only used when it literally
    /// occurs in the title.
    #[serde(default)]
    pub known_player_name_hint: Option<String>,

    /// Previously stored extraction, diffed against the fresh result
    #[serde(default)]
    pub prior_extraction: Option<ExtractionResult>,
}

impl ExtractionContext {
    pub fn with_player_hint(hint: impl Into<String>) -> Self {
        Self {
            known_player_name_hint: Some(hint.into()),
            prior_extraction: None,
        }
    }

    #[must_use]
    pub fn with_prior(prior: ExtractionResult) -> Self {
        Self {
            known_player_name_hint: None,
            prior_extraction: Some(prior),
        }
    }
}
