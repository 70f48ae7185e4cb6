//! Domain module - listing, extraction record and vocabulary types
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod card_type;
pub mod extraction;
pub mod knowledge;
pub mod listing;
pub mod sport;

pub use card_type::{CardTypeFlag, CardTypeFlags};
pub use extraction::{ChangeKind, DiffVerdict, ExtractionDiff, ExtractionResult, FieldChange};
pub use knowledge::{CatalogParallel, CatalogSet, Category, KnowledgeEntry, Match, Specificity};
pub use listing::{ExtractionContext, RawListing};
pub use sport::Sport;
