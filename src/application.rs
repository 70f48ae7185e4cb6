//! Application layer: the extraction pipeline and the maintenance jobs
//! built on top of it.

pub mod data_quality;
pub mod extraction_service;
pub mod maintenance;

pub use data_quality::{DataQualityAnalyzer, DataQualityReport, StorageAssessment, StorageRecommendation};
pub use extraction_service::{ExtractionOutcome, ExtractionPipeline};
pub use maintenance::{MaintenanceService, ReprocessReport};
