//! The display region every handler renders into

use crate::registry::LookupOutcome;
use std::sync::{Arc, Mutex};

/// What the display region currently shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DisplayContent {
    #[default]
    Empty,
    /// Request in flight
    Loading(String),
    /// Static informational message
    Notice(String),
    /// Markup returned by the registry
    Html(String),
    /// Failed call. `payload` holds any markup the server sent with it.
    Error {
        message: String,
        payload: Option<String>,
    },
}

impl DisplayContent {
    pub fn from_outcome(outcome: LookupOutcome) -> Self {
        match outcome {
            Ok(html) => Self::Html(html),
            Err(e) => Self::Error {
                message: e.to_string(),
                payload: e.payload().map(str::to_string),
            },
        }
    }

    /// Markup to show: the registry payload on success, or whatever the
    /// server sent along with a failure
    pub fn markup(&self) -> Option<&str> {
        match self {
            Self::Html(html) => Some(html),
            Self::Error { payload, .. } => payload.as_deref(),
            _ => None,
        }
    }
}

/// Output target for page handlers
///
/// Rendering replaces the previous content entirely.
pub trait DisplayRegion: Send + Sync {
    fn render(&self, content: DisplayContent);
}

pub type SharedRegion = Arc<dyn DisplayRegion>;

#[derive(Debug, Default)]
struct Snapshot {
    content: DisplayContent,
    revision: u64,
}

/// In-memory display region, read back by the TUI each frame
#[derive(Debug, Clone, Default)]
pub struct SharedDisplay {
    inner: Arc<Mutex<Snapshot>>,
}

impl SharedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> DisplayContent {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .content
            .clone()
    }

    /// Increments on every render, so readers can skip unchanged frames
    pub fn revision(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).revision
    }
}

impl DisplayRegion for SharedDisplay {
    fn render(&self, content: DisplayContent) {
        let mut snapshot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        snapshot.content = content;
        snapshot.revision += 1;
    }
}
