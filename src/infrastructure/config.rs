//! Configuration infrastructure
//!
//! Layered configuration: built-in defaults (`config/default.toml`, compiled
//! in), an optional file, an optional per-environment file, then environment
//! variables prefixed `CARD_EXTRACTOR` with `__` between nested keys
//! (`CARD_EXTRACTOR_SPORT_LOOKUP__TIMEOUT_MS=1500`).

use anyhow::{Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;

const DEFAULT_TOML: &str = include_str!("../../config/default.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extraction: ExtractionSettings,
    pub knowledge: KnowledgeSettings,
    pub sport_lookup: SportLookupConfig,
    pub maintenance: MaintenanceConfig,
    pub logging: LoggingConfig,
}

/// Tunables of the extraction pipeline itself
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Upper bound for years is `current_year + 1`; wall clock when unset
    pub current_year: Option<u16>,
    pub min_year: u16,
    pub name_min_chars: usize,
    pub name_max_chars: usize,
    /// Jaro-Winkler similarity a catalog pattern needs to count as a hit
    pub fuzzy_catalog_threshold: f64,
    /// Confidence deducted per ambiguous overlap settled by declaration order
    pub ambiguity_penalty: f64,
}

impl ExtractionSettings {
    /// Resolved once when a pipeline is built, so one pipeline never changes
    /// its year window mid-run
    pub fn resolved_current_year(&self) -> u16 {
        self.current_year.unwrap_or_else(|| {
            u16::try_from(chrono::Utc::now().year()).unwrap_or(defaults::FALLBACK_CURRENT_YEAR)
        })
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            current_year: None,
            min_year: defaults::MIN_YEAR,
            name_min_chars: defaults::NAME_MIN_CHARS,
            name_max_chars: defaults::NAME_MAX_CHARS,
            fuzzy_catalog_threshold: defaults::FUZZY_CATALOG_THRESHOLD,
            ambiguity_penalty: defaults::AMBIGUITY_PENALTY,
        }
    }
}

/// Where knowledge tables and normalizer rules come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Directory of `<category>.json` table files; embedded tables when unset
    pub data_dir: Option<PathBuf>,
    /// Alternative `normalizer.json`; embedded rules when unset
    pub normalizer_rules: Option<PathBuf>,
}

/// External player→sport directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SportLookupConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_requests_per_second: u32,
    pub user_agent: String,
}

impl Default for SportLookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: defaults::SPORT_LOOKUP_BASE_URL.to_string(),
            timeout_ms: defaults::SPORT_LOOKUP_TIMEOUT_MS,
            max_requests_per_second: defaults::SPORT_LOOKUP_MAX_RPS,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

/// Reprocessing jobs over stored listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// In-flight external lookups during an enriched batch
    pub max_concurrent_lookups: usize,
    /// Results below this confidence are flagged in the quality report
    pub low_confidence_threshold: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: defaults::MAX_CONCURRENT_LOOKUPS,
            low_confidence_threshold: defaults::LOW_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; the per-user data directory when unset
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Keep only the most recent log file (delete all others)
    pub keep_only_latest: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            keep_only_latest: defaults::LOG_KEEP_ONLY_LATEST,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("tokio".to_string(), "info".to_string());
                filters.insert("card_listing_extractor_lib".to_string(), "info".to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    fn builder() -> config::ConfigBuilder<config::builder::DefaultState> {
        config::Config::builder().add_source(config::File::from_str(DEFAULT_TOML, config::FileFormat::Toml))
    }

    /// `CARD_EXTRACTOR_<SECTION>__<KEY>`; `vars` replaces the process
    /// environment when given
    fn environment(vars: Option<config::Map<String, String>>) -> config::Environment {
        config::Environment::with_prefix(defaults::ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(vars)
    }

    /// Defaults, then the given file (if any), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_vars(path, None)
    }

    fn load_with_vars(path: Option<&Path>, vars: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let config: Self = builder.add_source(Self::environment(vars)).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `config/default` plus an optional `config/{env}` overlay
    pub fn for_environment(env: &str) -> Result<Self, ConfigError> {
        let config: Self = Self::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(Self::environment(None))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Validation { message });

        let e = &self.extraction;
        if e.name_min_chars == 0 || e.name_min_chars > e.name_max_chars {
            return invalid(format!(
                "name_min_chars ({}) must be positive and not exceed name_max_chars ({})",
                e.name_min_chars, e.name_max_chars
            ));
        }
        if let Some(current) = e.current_year {
            if current < e.min_year {
                return invalid(format!("current_year {current} is before min_year {}", e.min_year));
            }
        }
        if !(0.0..=1.0).contains(&e.fuzzy_catalog_threshold) {
            return invalid("fuzzy_catalog_threshold must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&e.ambiguity_penalty) {
            return invalid("ambiguity_penalty must be within [0, 1]".to_string());
        }

        let s = &self.sport_lookup;
        if s.timeout_ms == 0 || s.timeout_ms > defaults::SPORT_LOOKUP_MAX_TIMEOUT_MS {
            return invalid(format!(
                "sport_lookup.timeout_ms must be within 1..={} (got {})",
                defaults::SPORT_LOOKUP_MAX_TIMEOUT_MS,
                s.timeout_ms
            ));
        }
        if s.max_requests_per_second == 0 {
            return invalid("sport_lookup.max_requests_per_second must be greater than 0".to_string());
        }
        if s.enabled && s.base_url.trim().is_empty() {
            return invalid("sport_lookup.base_url is required when the lookup is enabled".to_string());
        }

        if self.maintenance.max_concurrent_lookups == 0 {
            return invalid("maintenance.max_concurrent_lookups must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.maintenance.low_confidence_threshold) {
            return invalid("maintenance.low_confidence_threshold must be within [0, 1]".to_string());
        }

        Ok(())
    }
}

/// Configuration manager for the per-user settings file
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(data_dir)
    }

    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Load the user file over the defaults, creating it on first run
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::load(None)?;
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let config = AppConfig::load(Some(&self.config_path))
            .with_context(|| format!("Failed to load configuration from {:?}", self.config_path))?;
        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        }
        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;
        info!("Configuration saved to: {:?}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "card-listing-extractor";
    pub const CONFIG_FILE_NAME: &str = "card_extractor_config.json";
    pub const ENV_PREFIX: &str = "CARD_EXTRACTOR";
    pub const USER_AGENT: &str = "card-listing-extractor/0.2";

    // Extraction defaults
    pub const MIN_YEAR: u16 = 1900;
    pub const FALLBACK_CURRENT_YEAR: u16 = 2025;
    pub const NAME_MIN_CHARS: usize = 3;
    pub const NAME_MAX_CHARS: usize = 30;
    pub const FUZZY_CATALOG_THRESHOLD: f64 = 0.92;
    pub const AMBIGUITY_PENALTY: f64 = 0.05;

    // Sport lookup defaults
    pub const SPORT_LOOKUP_BASE_URL: &str = "http://127.0.0.1:8080";
    pub const SPORT_LOOKUP_TIMEOUT_MS: u64 = 1500;
    pub const SPORT_LOOKUP_MAX_TIMEOUT_MS: u64 = 2000;
    pub const SPORT_LOOKUP_MAX_RPS: u32 = 5;

    // Maintenance defaults
    pub const MAX_CONCURRENT_LOOKUPS: usize = 4;
    pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.4;

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_MAX_FILES: u32 = 5;
    pub const LOG_AUTO_CLEANUP: bool = true;
    pub const LOG_KEEP_ONLY_LATEST: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults_validate() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.sport_lookup.timeout_ms, defaults::SPORT_LOOKUP_TIMEOUT_MS);
        assert!(!config.sport_lookup.enabled);
        assert_eq!(config.extraction.name_max_chars, 30);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.toml");
        std::fs::write(&path, "[extraction]\ncurrent_year = 2024\n\n[sport_lookup]\ntimeout_ms = 800\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.extraction.resolved_current_year(), 2024);
        assert_eq!(config.sport_lookup.timeout_ms, 800);
        assert_eq!(config.extraction.min_year, defaults::MIN_YEAR);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.toml");
        std::fs::write(&path, "[sport_lookup]\ntimeout_ms = 800\n").unwrap();
        let vars = config::Map::from_iter([
            ("CARD_EXTRACTOR_SPORT_LOOKUP__TIMEOUT_MS".to_string(), "900".to_string()),
            ("CARD_EXTRACTOR_LOGGING__LEVEL".to_string(), "debug".to_string()),
            ("OTHER_APP_LOGGING__LEVEL".to_string(), "trace".to_string()),
        ]);

        let config = AppConfig::load_with_vars(Some(&path), Some(vars)).unwrap();
        assert_eq!(config.sport_lookup.timeout_ms, 900);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_lookup_timeout_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.toml");
        std::fs::write(&path, "[sport_lookup]\ntimeout_ms = 5000\n").unwrap();

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_name_bounds_validated() {
        let mut config = AppConfig::default();
        config.extraction.name_min_chars = 40;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_manager_creates_file_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));
        let config = manager.load_config().await.unwrap();
        assert!(manager.config_path().exists());

        let reloaded = manager.load_config().await.unwrap();
        assert_eq!(reloaded.sport_lookup.timeout_ms, config.sport_lookup.timeout_ms);
    }
}
