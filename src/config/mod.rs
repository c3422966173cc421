//! Configuration for the lookup tool
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/hoa-lookup/config.toml)
//! 3. Built-in defaults (lowest priority)

use crate::binder::delay_from_millis;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod sections;
mod serialization;

#[cfg(test)]
mod tests;

pub use logging::{FileLogging, LogRotation, LoggingConfig};
pub use sections::{FileScrape, FileSearch, ScrapeConfig, SearchConfig};

use crate::page::{PageSettings, DEFAULT_RETURN_URL};
use crate::registry::{ClientSettings, RetryPolicy};
use crate::scrape::ScrapeOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ENDPOINT: &str = "https://services.commerce.utah.gov/hoa/assets/js/hoa-ajax.php";

/// The registry is built for browsers; a plain client UA gets odd answers
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_ENDPOINT: &str = "HOA_LOOKUP_ENDPOINT";
pub const ENV_DEBOUNCE_MS: &str = "HOA_LOOKUP_DEBOUNCE_MS";
pub const ENV_DEMO: &str = "HOA_LOOKUP_DEMO";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Registry AJAX endpoint
    pub endpoint: String,

    /// User-Agent header sent with every registry request
    pub user_agent: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Where the return control navigates to
    pub return_url: String,

    /// Demo mode: serve canned records from an in-process fake registry
    pub demo_mode: bool,

    /// Search box settings
    pub search: SearchConfig,

    /// Bulk export settings
    pub scrape: ScrapeConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            return_url: DEFAULT_RETURN_URL.to_string(),
            demo_mode: false,
            search: SearchConfig::default(),
            scrape: ScrapeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub endpoint: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub return_url: Option<String>,

    /// Optional [search] section
    pub search: Option<FileSearch>,

    /// Optional [scrape] section
    pub scrape: Option<FileScrape>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

fn is_truthy(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/hoa-lookup/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("hoa-lookup").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load the config file if it exists
    ///
    /// A file that exists but cannot be read or parsed is an error, not a
    /// silent fallback to defaults.
    fn load_file_config() -> Result<FileConfig> {
        let Some(path) = Self::config_path() else {
            return Ok(FileConfig::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config file: {}", path.display()))
            }
        }
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Result<Self> {
        let file = Self::load_file_config()?;
        Ok(Self::resolve(file, |key| std::env::var(key).ok()))
    }

    /// File values and defaults only, as written back by [`Config::save`]
    pub fn from_file() -> Result<Self> {
        let file = Self::load_file_config()?;
        Ok(Self::resolve(file, |_| None))
    }

    /// Merge a parsed file with environment lookups
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // Endpoint: env > file > default
        let endpoint = env(ENV_ENDPOINT)
            .or(file.endpoint)
            .unwrap_or(defaults.endpoint);

        let user_agent = file.user_agent.unwrap_or(defaults.user_agent);
        let timeout_secs = file.timeout_secs.unwrap_or(defaults.timeout_secs);
        let return_url = file.return_url.unwrap_or(defaults.return_url);

        // Demo mode: env only (runtime flag)
        let demo_mode = env(ENV_DEMO).map(|v| is_truthy(&v)).unwrap_or(false);

        // Debounce: env > file > default
        let mut search = SearchConfig::from_file(file.search);
        // Zero or negative overrides are ignored
        if let Some(delay) = env(ENV_DEBOUNCE_MS)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|ms| delay_from_millis(ms).ok())
        {
            search.debounce_ms = delay.as_millis() as u64;
        }

        let scrape = ScrapeConfig::from_file(file.scrape);
        let logging = LoggingConfig::from_file(file.logging);

        Self {
            endpoint,
            user_agent,
            timeout_secs,
            return_url,
            demo_mode,
            search,
            scrape,
            logging,
        }
    }

    /// Write this configuration to the config file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Could not determine config path")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&path, self.to_toml())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    /// Remember the last export limit and directory
    pub fn save_scrape_settings(limit: usize, save_dir: PathBuf) -> Result<PathBuf> {
        let mut stored = Self::from_file()?;
        stored.scrape.limit = limit;
        stored.scrape.save_dir = save_dir;
        stored.save()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Views for the components
    // ─────────────────────────────────────────────────────────────────────────

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            search_delay: Duration::from_millis(self.search.debounce_ms),
            return_url: self.return_url.clone(),
        }
    }

    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            limit: self.scrape.limit,
            workers: self.scrape.workers,
            retry: RetryPolicy {
                attempts: self.scrape.retries.max(1),
                pause: Duration::from_secs(1),
            },
        }
    }
}
