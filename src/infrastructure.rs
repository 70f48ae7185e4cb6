//! Infrastructure layer: knowledge tables, title parsing, configuration,
//! logging and the external collaborators (sport directory, extraction store).

pub mod config;
pub mod extraction_error;
pub mod extraction_store;
pub mod knowledge;
pub mod logging;
pub mod parsing;
pub mod sport_directory;

pub use config::{AppConfig, ConfigError, ConfigManager};
pub use extraction_error::{ExtractionError, KnowledgeError, LookupError, StoreError};
pub use extraction_store::{ExtractionStore, InMemoryExtractionStore, StoredExtraction};
pub use knowledge::{KnowledgeBase, KnowledgeRegistry, KnowledgeSource};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use sport_directory::{HttpSportDirectory, PlayerSportDirectory, StaticSportDirectory};
