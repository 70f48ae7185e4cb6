//! Error types for the extraction pipeline and its collaborators
//!
//! None of these escape the public extraction API: each one is caught at the
//! component boundary and turned into a degraded-but-valid result.

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::Category;

#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("Malformed listing input: {reason}")]
    MalformedInput { reason: String },

    #[error("Knowledge table '{category}' unavailable: {reason}")]
    KnowledgeTableUnavailable { category: Category, reason: String },

    #[error("External lookup failed for '{subject}': {reason}")]
    ExternalLookupFailure { subject: String, reason: String },

    #[error("Ambiguous match between '{first}' and '{second}' resolved by declaration order")]
    AmbiguousMatch { first: String, second: String },
}

impl ExtractionError {
    pub fn malformed(reason: &str) -> Self {
        Self::MalformedInput {
            reason: reason.to_string(),
        }
    }

    pub fn table_unavailable(category: Category, reason: impl ToString) -> Self {
        Self::KnowledgeTableUnavailable {
            category,
            reason: reason.to_string(),
        }
    }

    pub fn lookup_failure(subject: &str, reason: impl ToString) -> Self {
        Self::ExternalLookupFailure {
            subject: subject.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn ambiguous(first: &str, second: &str) -> Self {
        Self::AmbiguousMatch {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    /// Expected, frequent failures are logged below warn level
    pub const fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::ExternalLookupFailure { .. } | Self::AmbiguousMatch { .. }
        )
    }

    pub fn report(&self) {
        if self.is_expected() {
            debug!("{}", self);
        } else {
            warn!("{}", self);
        }
    }
}

/// Errors raised while loading knowledge tables
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed knowledge file {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Knowledge file {path} declares category '{found}', expected '{expected}'")]
    CategoryMismatch {
        path: String,
        expected: Category,
        found: String,
    },

    #[error("Catalog source unavailable: {0}")]
    Catalog(String),

    #[error("Invalid normalizer rule '{rule}': {source}")]
    InvalidRule {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

impl KnowledgeError {
    pub fn into_extraction_error(self, category: Category) -> ExtractionError {
        ExtractionError::table_unavailable(category, self)
    }
}

/// Errors from the external player→sport directory
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Lookup timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Directory returned status {status}")]
    Status { status: u16 },

    #[error("Malformed directory response: {0}")]
    Malformed(String),

    #[error("Lookup disabled")]
    Disabled,
}

impl LookupError {
    pub fn into_extraction_error(self, player: &str) -> ExtractionError {
        ExtractionError::lookup_failure(player, self)
    }
}

/// Errors from an extraction store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Listing '{0}' has no source id and cannot be stored")]
    MissingKey(String),

    #[error("Store backend failure: {0}")]
    Backend(String),
}
