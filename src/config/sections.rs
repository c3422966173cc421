//! Search box and bulk export settings

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Search
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is sent
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 200 }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSearch {
    pub debounce_ms: Option<u64>,
}

impl SearchConfig {
    pub fn from_file(file: Option<FileSearch>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            debounce_ms: file.debounce_ms.unwrap_or(defaults.debounce_ms),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scrape
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Maximum HOAs per export; 0 exports everything
    pub limit: usize,
    /// Directory the CSV is written into
    pub save_dir: PathBuf,
    /// Concurrent detail fetches
    pub workers: usize,
    /// Attempts per request, including the first
    pub retries: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            limit: 0,
            save_dir: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            workers: 20,
            retries: 3,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileScrape {
    pub limit: Option<usize>,
    pub save_dir: Option<String>,
    pub workers: Option<usize>,
    pub retries: Option<u32>,
}

impl ScrapeConfig {
    pub fn from_file(file: Option<FileScrape>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            limit: file.limit.unwrap_or(defaults.limit),
            save_dir: file
                .save_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.save_dir),
            workers: file.workers.unwrap_or(defaults.workers),
            retries: file.retries.unwrap_or(defaults.retries),
        }
    }
}
