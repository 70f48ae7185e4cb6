//! Logging system configuration and initialization
//!
//! - Console output on stderr (stdout carries extraction records)
//! - Optional non-blocking file output with rotation of the previous run's log
//! - Optional JSON formatting
//! - `RUST_LOG` overrides the configured filter entirely

use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::ConfigManager;

const LOG_FILE_NAME: &str = "card-extractor.log";

// Keeps the file writer alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Configured directory, else `<data dir>/card-listing-extractor/logs`, else
/// `logs` next to the executable
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = &config.log_dir {
        return dir.clone();
    }
    ConfigManager::get_app_data_dir().map_or_else(
        |_| {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(Path::to_path_buf))
                .unwrap_or_default()
                .join("logs")
        },
        |dir| dir.join("logs"),
    )
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Rename the previous run's log file with its modification timestamp
fn rotate_existing_log_file(log_dir: &Path) -> Result<()> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);
    if !log_file_path.exists() {
        return Ok(());
    }

    let metadata =
        std::fs::metadata(&log_file_path).map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;
    let file_time = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let datetime: chrono::DateTime<chrono::Utc> = file_time.into();

    let file_stem = LOG_FILE_NAME.trim_end_matches(".log");
    let timestamped_name = format!("{}.{}.log", file_stem, datetime.format("%Y%m%dT%H%M%S"));
    let timestamped_path = log_dir.join(&timestamped_name);

    std::fs::rename(&log_file_path, &timestamped_path).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {}",
            log_file_path.display(),
            timestamped_path.display(),
            e
        )
    })?;
    Ok(())
}

/// Filter from the configured level plus per-module directives. Dependency
/// chatter stays quiet unless the level is trace.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);
        if config.level.to_lowercase().contains("trace") {
            return filter;
        }

        let mut modules: Vec<_> = config.module_filters.iter().collect();
        modules.sort();
        for (module, level) in modules {
            match format!("{module}={level}").parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => eprintln!("Ignoring invalid log filter {module}={level}: {e}"),
            }
        }
        filter
    })
}

/// Initialize logging with custom configuration
///
/// ```bash
/// # Show HTTP details from the sport directory client
/// RUST_LOG="debug,reqwest=debug,hyper=debug" reprocess_titles titles.txt
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let log_dir = get_log_directory(config);

    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;
        rotate_existing_log_file(&log_dir)?;

        let file_appender = rolling::never(&log_dir, LOG_FILE_NAME);
        let (file_writer, file_guard) = non_blocking(file_appender);
        LOG_GUARDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(file_guard);

        let file_layer = fmt::Layer::new().with_writer(file_writer).with_ansi(false);
        if config.json_format {
            layers.push(
                file_layer
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .boxed(),
            );
        } else {
            layers.push(file_layer.with_target(false).boxed());
        }
    }

    if config.console_output {
        let console_layer = fmt::Layer::new().with_writer(std::io::stderr).with_target(false);
        if config.json_format {
            layers.push(console_layer.json().boxed());
        } else {
            layers.push(console_layer.boxed());
        }
    }

    Registry::default()
        .with(layers)
        .with(build_filter(config))
        .try_init()
        .map_err(|e| anyhow!("Logging already initialized: {}", e))?;

    info!("Logging system initialized (level {})", config.level);
    if config.file_output {
        info!("Log directory: {:?}", log_dir);
        if config.auto_cleanup_logs {
            cleanup_old_logs(&log_dir, config)?;
        }
    }
    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Card Listing Extractor ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}

fn log_files(log_dir: &Path) -> Result<Vec<(PathBuf, std::time::SystemTime)>> {
    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.extension().is_some_and(|ext| ext == "log");
        if path.is_file() && is_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }
    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(log_files)
}

/// Delete rotated logs beyond `max_files` (or all but the newest)
pub fn cleanup_old_logs(log_dir: &Path, config: &LoggingConfig) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let keep = if config.keep_only_latest { 1 } else { config.max_files as usize };
    let mut removed = 0;
    for (path, _) in log_files(log_dir)?.iter().skip(keep) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }
    if removed > 0 {
        info!("Removed {} old log files (keeping {})", removed, keep);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(15));
    }

    #[test]
    fn test_configured_log_directory_wins() {
        let config = LoggingConfig {
            log_dir: Some(PathBuf::from("/tmp/extractor-logs")),
            ..LoggingConfig::default()
        };
        assert_eq!(get_log_directory(&config), PathBuf::from("/tmp/extractor-logs"));
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.log", "b.log", "c.log", "notes.txt"] {
            touch(dir.path(), name);
        }
        let config = LoggingConfig {
            max_files: 2,
            ..LoggingConfig::default()
        };
        assert_eq!(cleanup_old_logs(dir.path(), &config).unwrap(), 1);
        assert!(!dir.path().join("a.log").exists());
        assert!(dir.path().join("c.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_keep_only_latest() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.log", "b.log"] {
            touch(dir.path(), name);
        }
        let config = LoggingConfig {
            keep_only_latest: true,
            ..LoggingConfig::default()
        };
        cleanup_old_logs(dir.path(), &config).unwrap();
        assert!(dir.path().join("b.log").exists());
        assert!(!dir.path().join("a.log").exists());
    }

    #[test]
    fn test_rotation_renames_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOG_FILE_NAME), "old run").unwrap();
        rotate_existing_log_file(dir.path()).unwrap();
        assert!(!dir.path().join(LOG_FILE_NAME).exists());
        assert_eq!(log_files(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }
}
