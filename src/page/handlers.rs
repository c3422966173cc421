//! Event-to-request mappings for the lookup page
//!
//! Each handler owns the handles it needs, injected at construction.
//! Requests run as spawned tasks; whichever completes last owns the display
//! region. There is no sequencing between overlapping requests.

use super::display::{DisplayContent, SharedRegion};
use super::{SharedNavigator, SharedNotifier};
use crate::registry::{LookupRequest, SharedTransport};
use std::fmt;
use tokio::task::JoinHandle;

pub const SEARCHING_MESSAGE: &str = "Searching... one moment please.";
pub const LOADING_MESSAGE: &str = "Loading... one moment please.";
pub const SEARCH_INSTRUCTIONS: &str =
    "Please enter a name or registration number to search for.";

/// Show the placeholder, then render whatever the call returns
fn request_into_display(
    transport: &SharedTransport,
    display: &SharedRegion,
    request: LookupRequest,
    placeholder: &str,
) -> JoinHandle<()> {
    display.render(DisplayContent::Loading(placeholder.to_string()));

    let response = transport.post(request.clone());
    let display = display.clone();
    tokio::spawn(async move {
        let outcome = response.await;
        if let Err(e) = &outcome {
            tracing::warn!("{} failed: {}", request, e);
        }
        display.render(DisplayContent::from_outcome(outcome));
    })
}

/// Free-text search from the search box
#[derive(Clone)]
pub struct SearchHandler {
    transport: SharedTransport,
    display: SharedRegion,
}

impl SearchHandler {
    pub fn new(transport: SharedTransport, display: SharedRegion) -> Self {
        Self { transport, display }
    }

    /// Returns the request task, or `None` when the query was blank and only
    /// the instructions were shown
    pub fn handle(&self, query: &str) -> Option<JoinHandle<()>> {
        let query = query.trim();
        if query.is_empty() {
            self.display
                .render(DisplayContent::Notice(SEARCH_INSTRUCTIONS.to_string()));
            return None;
        }

        tracing::debug!("Searching for {:?}", query);
        Some(request_into_display(
            &self.transport,
            &self.display,
            LookupRequest::Search(query.to_string()),
            SEARCHING_MESSAGE,
        ))
    }
}

/// The row identifier was missing or not an integer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidIdentifier(pub Option<String>);

impl fmt::Display for InvalidIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(raw) => write!(f, "An invalid identifier was passed: {:?}", raw),
            None => write!(f, "An invalid identifier was passed: row has no identifier"),
        }
    }
}

impl std::error::Error for InvalidIdentifier {}

/// Parse a row identifier. Only plain non-negative integers pass.
pub fn parse_identifier(raw: Option<&str>) -> Result<u64, InvalidIdentifier> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| InvalidIdentifier(raw.map(str::to_string)))
}

/// Loads one entity's detail view
#[derive(Clone)]
pub struct EntityLoader {
    transport: SharedTransport,
    display: SharedRegion,
    notifier: SharedNotifier,
}

impl EntityLoader {
    pub fn new(transport: SharedTransport, display: SharedRegion, notifier: SharedNotifier) -> Self {
        Self {
            transport,
            display,
            notifier,
        }
    }

    /// Validate `raw_id` and request the detail. An invalid id raises a
    /// blocking notification and never reaches the network.
    pub fn handle(&self, raw_id: Option<&str>) -> Result<JoinHandle<()>, InvalidIdentifier> {
        let id = match parse_identifier(raw_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("{}", e);
                self.notifier.alert(&e.to_string());
                return Err(e);
            }
        };

        Ok(request_into_display(
            &self.transport,
            &self.display,
            LookupRequest::Detail(id),
            LOADING_MESSAGE,
        ))
    }
}

/// Full registry listing
#[derive(Clone)]
pub struct ListHandler {
    transport: SharedTransport,
    display: SharedRegion,
}

impl ListHandler {
    pub fn new(transport: SharedTransport, display: SharedRegion) -> Self {
        Self { transport, display }
    }

    pub fn handle(&self) -> JoinHandle<()> {
        request_into_display(
            &self.transport,
            &self.display,
            LookupRequest::ListAll,
            LOADING_MESSAGE,
        )
    }
}

/// Leaves the lookup page for the registry's public site
#[derive(Clone)]
pub struct NavigationHandler {
    navigator: SharedNavigator,
    url: String,
}

impl NavigationHandler {
    pub fn new(navigator: SharedNavigator, url: impl Into<String>) -> Self {
        Self {
            navigator,
            url: url.into(),
        }
    }

    pub fn handle(&self) {
        tracing::info!("Navigating to {}", self.url);
        self.navigator.navigate(&self.url);
    }
}
