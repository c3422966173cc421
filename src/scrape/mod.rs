//! Bulk registry export
//!
//! Lists every registered HOA with a wildcard search, fetches each detail
//! page with bounded concurrency, and parses the pages into records for the
//! CSV export. Failed detail fetches are logged and skipped.

pub mod export;
pub mod parse;

pub use export::{export_to_dir, write_csv, EXPORT_FILE_NAME};
pub use parse::{
    listing_entries, parse_detail, parse_listing, Contact, HoaRecord, ListingEntry, ListingRow, Role,
};

use crate::registry::{post_with_retry, LookupRequest, RetryPolicy, SharedTransport, SEARCH_ALL};
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};

/// Progress is reported after this many completed detail fetches
pub const PROGRESS_EVERY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Maximum number of HOAs to fetch; 0 means all
    pub limit: usize,
    /// Concurrent detail fetches
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            limit: 0,
            workers: 20,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScrapeReport {
    /// Rows in the registry listing
    pub found: usize,
    /// Detail pages attempted
    pub attempted: usize,
    /// Parsed records, in listing order
    pub records: Vec<HoaRecord>,
}

impl ScrapeReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.records.len()
    }
}

pub struct Scraper {
    transport: SharedTransport,
    options: ScrapeOptions,
}

impl Scraper {
    pub fn new(transport: SharedTransport, options: ScrapeOptions) -> Self {
        Self { transport, options }
    }

    /// Fetch the listing, then every detail page up to the limit
    ///
    /// `on_progress` is called every [`PROGRESS_EVERY`] completions and once
    /// at the end. An unreachable listing is an error; individual detail
    /// failures are not.
    pub async fn run(&self, mut on_progress: impl FnMut(Progress)) -> Result<ScrapeReport> {
        let listing = post_with_retry(
            self.transport.as_ref(),
            LookupRequest::Search(SEARCH_ALL.to_string()),
            self.options.retry,
        )
        .await
        .context("Failed to fetch HOA list")?;

        let rows = parse_listing(&listing);
        let found = rows.len();
        let total = match self.options.limit {
            0 => found,
            limit => limit.min(found),
        };
        tracing::info!("Found {} HOAs. Processing {}...", found, total);

        let workers = self.options.workers.max(1);
        let mut fetches = stream::iter(rows.into_iter().take(total).enumerate())
            .map(|(index, row)| {
                let transport = self.transport.clone();
                let retry = self.options.retry;
                async move {
                    let outcome =
                        post_with_retry(transport.as_ref(), LookupRequest::Detail(row.pid), retry).await;
                    (index, row, outcome)
                }
            })
            .buffer_unordered(workers);

        let mut parsed: Vec<(usize, HoaRecord)> = Vec::with_capacity(total);
        let mut completed = 0;
        while let Some((index, row, outcome)) = fetches.next().await {
            completed += 1;
            match outcome {
                Ok(html) if html.trim().is_empty() => {
                    tracing::warn!("Empty detail page for {} (#{})", row.name, row.pid)
                }
                Ok(html) => parsed.push((index, parse_detail(&html, row.pid))),
                Err(e) => tracing::warn!("Error processing {} (#{}): {}", row.name, row.pid, e),
            }
            if completed % PROGRESS_EVERY == 0 || completed == total {
                tracing::debug!("Processed: {}/{}", completed, total);
                on_progress(Progress { completed, total });
            }
        }

        parsed.sort_by_key(|(index, _)| *index);
        Ok(ScrapeReport {
            found,
            attempted: total,
            records: parsed.into_iter().map(|(_, r)| r).collect(),
        })
    }
}
