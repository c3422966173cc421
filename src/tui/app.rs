// TUI application state
//
// The App is the terminal "document": it owns the search input, the event
// dispatcher the page is mounted on, and the display region the page
// renders into. Key presses become page events (keyup on the search box,
// clicks on rows and buttons); everything the page does comes back through
// the display region and the host handles.

use super::host::TerminalHost;
use super::modal::Modal;
use crate::dispatch::{BindError, Dispatcher, Element, Event};
use crate::logging::LogBuffer;
use crate::page::{
    selectors, DisplayContent, LookupPage, PageServices, PageSettings, SharedDisplay,
};
use crate::registry::SharedTransport;
use crate::scrape::{listing_entries, ListingEntry};
use std::sync::Arc;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Strip the leading `#` from an id selector
fn id_of(selector: &str) -> &str {
    selector.trim_start_matches('#')
}

/// Main application state for the TUI
pub struct App {
    /// Current contents of the search box
    pub query: String,

    /// What the page last rendered
    pub display: SharedDisplay,

    /// Alerts, focus, injected controls and navigation requested by the page
    pub host: Arc<TerminalHost>,

    dispatcher: Dispatcher,

    /// Clickable rows of the current listing
    pub rows: Vec<ListingEntry>,

    pub selected: Option<usize>,

    /// Display revision `rows` was built from
    seen_revision: u64,

    /// Scroll offset for text content
    pub scroll: u16,

    pub modal: Option<Modal>,

    pub log_buffer: LogBuffer,

    pub should_quit: bool,

    /// Set when the page navigated away
    pub leave_to: Option<String>,

    /// Endpoint shown in the title bar
    pub endpoint: String,

    pub demo: bool,

    spinner_frame: usize,
}

impl App {
    /// Mount a lookup page on a fresh dispatcher and run its ready hook
    pub fn new(
        transport: SharedTransport,
        settings: PageSettings,
        log_buffer: LogBuffer,
        endpoint: impl Into<String>,
        demo: bool,
    ) -> Result<Self, BindError> {
        let display = SharedDisplay::new();
        let host = Arc::new(TerminalHost::new());
        let page = LookupPage::new(
            PageServices {
                transport,
                display: Arc::new(display.clone()),
                notifier: host.clone(),
                navigator: host.clone(),
                chrome: host.clone(),
            },
            settings,
        );

        let mut dispatcher = Dispatcher::new();
        page.mount(&mut dispatcher)?;
        page.ready();

        Ok(Self {
            query: String::new(),
            display,
            host,
            dispatcher,
            rows: Vec::new(),
            selected: None,
            seen_revision: 0,
            scroll: 0,
            modal: None,
            log_buffer,
            should_quit: false,
            leave_to: None,
            endpoint: endpoint.into(),
            demo,
            spinner_frame: 0,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Page events
    // ─────────────────────────────────────────────────────────────────────────

    fn search_box(&self) -> Element {
        Element::new("input")
            .with_id(id_of(selectors::SEARCH_INPUT))
            .with_value(self.query.clone())
    }

    fn keyup(&mut self) {
        let event = Event::keyup(self.search_box());
        self.dispatcher.dispatch(&event);
    }

    pub fn type_char(&mut self, c: char) {
        self.query.push(c);
        self.keyup();
    }

    pub fn backspace(&mut self) {
        if self.query.pop().is_some() {
            self.keyup();
        }
    }

    pub fn clear_query(&mut self) {
        if !self.query.is_empty() {
            self.query.clear();
            self.keyup();
        }
    }

    /// Click the "View" link of the selected row
    pub fn open_selected(&mut self) {
        let Some(entry) = self.selected.and_then(|i| self.rows.get(i)) else {
            return;
        };

        let mut row = Element::new("tr").with_class("link-view");
        if let Some(pid) = &entry.pid {
            row = row.with_data("pid", pid.clone());
        }
        let link = Element::new("a")
            .with_class("link-view")
            .within(Element::new("td").within(row));

        self.dispatcher.dispatch(&Event::click(link));
    }

    pub fn list_all(&mut self) {
        let button = Element::new("button").with_id(id_of(selectors::LIST_BUTTON));
        self.dispatcher.dispatch(&Event::click(button));
    }

    /// Click the injected return control, if the page added one
    pub fn return_to_site(&mut self) {
        if let Some(control) = self.host.control(id_of(selectors::RETURN_BUTTON)) {
            self.dispatcher.dispatch(&Event::click(control.element));
        }
    }

    pub fn return_label(&self) -> Option<String> {
        self.host
            .control(id_of(selectors::RETURN_BUTTON))
            .map(|c| c.label)
    }

    pub fn search_focused(&self) -> bool {
        self.host.focused().as_deref() == Some(selectors::SEARCH_INPUT)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection and scrolling
    // ─────────────────────────────────────────────────────────────────────────

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            self.scroll = self.scroll.saturating_add(1);
            return;
        }
        let last = self.rows.len() - 1;
        self.selected = Some(self.selected.map(|i| (i + 1).min(last)).unwrap_or(0));
    }

    pub fn select_prev(&mut self) {
        if self.rows.is_empty() {
            self.scroll = self.scroll.saturating_sub(1);
            return;
        }
        self.selected = Some(self.selected.map(|i| i.saturating_sub(1)).unwrap_or(0));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-tick sync with the page
    // ─────────────────────────────────────────────────────────────────────────

    /// Pick up whatever the page did since the last frame
    pub fn sync(&mut self) {
        let revision = self.display.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.rows = match self.display.content() {
                DisplayContent::Html(html) => listing_entries(&html),
                _ => Vec::new(),
            };
            self.selected = if self.rows.is_empty() { None } else { Some(0) };
            self.scroll = 0;
        }

        if self.modal.is_none() {
            if let Some(message) = self.host.take_alert() {
                self.modal = Some(Modal::Alert(message));
            }
        }

        if let Some(url) = self.host.take_navigation() {
            self.leave_to = Some(url);
            self.should_quit = true;
        }
    }

    pub fn tick_animation(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
    }

    pub fn spinner_char(&self) -> char {
        SPINNER[self.spinner_frame]
    }
}
