// config.rs - Centralized configuration system

use crate::core::*;
use crate::cross_exchange::SymbolFilter;
use crate::sorting::{SortState, Timeframe, ViewOptions};
use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration singleton
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Returns a reference to the global configuration.
/// If not yet initialized, uses the default configuration.
pub fn get_config() -> &'static Config {
    CONFIG.get().unwrap_or(&*DEFAULT_CONFIG)
}

/// Initializes configuration from the given file path.
pub fn init_config<P: AsRef<Path>>(path: P) -> Result<(), AppError> {
    let config = Config::from_file(path)?.with_env_overrides();
    CONFIG
        .set(config)
        .map_err(|_| AppError::ConfigError("Configuration already initialized".to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub sources: SourcesConfig,
    pub monitor: MonitorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub pacifica_base_url: String,
    pub lighter_base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub max_symbols: Option<usize>,
    /// Polling interval; polling is off when unset or zero
    pub refresh_interval_ms: Option<u64>,
    pub target_symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub timeframe: Timeframe,
    pub sort: SortState,
    pub search: String,
    pub rate_precision: usize,
    pub percent_precision: usize,
}

/// Default configuration used when no config file is provided.
pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(Config::default);

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { log_level: String::from("info") }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            pacifica_base_url: PACIFICA_BASE_URL.to_string(),
            lighter_base_url: LIGHTER_BASE_URL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default(),
            sort: SortState::default(),
            search: String::new(),
            rate_precision: FUNDING_RATE_PRECISION,
            percent_precision: SPREAD_PERCENT_PRECISION,
        }
    }
}

impl Config {
    /// Returns a reference to the global configuration singleton.
    pub fn global() -> &'static OnceLock<Config> {
        &CONFIG
    }

    /// Load configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let file_format = path.as_ref().extension().and_then(|os| os.to_str());
        let contents = fs::read_to_string(path.as_ref())?;
        Self::parse(&contents, file_format)
    }

    /// Parse configuration text in the given format (`toml`, `json`, `yaml`).
    pub fn parse(contents: &str, file_format: Option<&str>) -> Result<Self, AppError> {
        match file_format {
            Some("toml") => toml::from_str(contents)
                .map_err(|e| AppError::ConfigError(format!("Failed to parse TOML config: {}", e))),
            Some("json") => serde_json::from_str(contents)
                .map_err(|e| AppError::ConfigError(format!("Failed to parse JSON config: {}", e))),
            Some("yaml") | Some("yml") => serde_yaml::from_str(contents)
                .map_err(|e| AppError::ConfigError(format!("Failed to parse YAML config: {}", e))),
            _ => Err(AppError::ConfigError("Unsupported config file format".to_string())),
        }
    }

    /// Apply endpoint and timeframe overrides from the environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(PACIFICA_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.sources.pacifica_base_url = url;
        }
        if let Some(url) = lookup(LIGHTER_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.sources.lighter_base_url = url;
        }
        if let Some(code) = lookup(TIMEFRAME_ENV).filter(|v| !v.trim().is_empty()) {
            match code.parse::<Timeframe>() {
                Ok(timeframe) => self.display.timeframe = timeframe,
                Err(e) => warn!("Ignoring {}: {}", TIMEFRAME_ENV, e),
            }
        }
        self
    }
}

impl MonitorConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn symbol_filter(&self) -> SymbolFilter {
        SymbolFilter {
            max_symbols: self.max_symbols,
            target_symbols: if self.target_symbols.is_empty() {
                None
            } else {
                Some(self.target_symbols.clone())
            },
        }
    }
}

impl DisplayConfig {
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            timeframe: self.timeframe,
            sort: self.sort,
            search: self.search.clone(),
        }
    }
}
