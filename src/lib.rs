//! Card Listing Extractor - structured records from trading card listing titles
//!
//! Turns free-text marketplace titles such as
//! `2021 Panini Prizm- Ja'marr Chase- Rookie Pink Prizm- PSA 10` into an
//! [`ExtractionResult`](domain::ExtractionResult): sport, year, brand,
//! product, parallel, print run, card number, player, card-type flags and a
//! canonical summary title.
//!
//! ```no_run
//! use card_listing_extractor_lib::application::ExtractionPipeline;
//! use card_listing_extractor_lib::domain::RawListing;
//!
//! let pipeline = ExtractionPipeline::builtin().expect("embedded rules are valid");
//! let result = pipeline.extract(&RawListing::new("2023 Bowman Chrome Paul Skenes /50"));
//! println!("{}", result.summary_title);
//! ```

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{ExtractionOutcome, ExtractionPipeline};
pub use domain::{ExtractionContext, ExtractionResult, RawListing, Sport};
