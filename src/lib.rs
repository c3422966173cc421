// HOA Lookup - Utah HOA registry search from the terminal
//
// Architecture:
// - Binder + dispatcher: debounced, delegated event bindings
// - Page: maps search box, row and button events to registry requests
// - Registry client (reqwest): form-encoded calls to the registry endpoint
// - TUI (ratatui): hosts the page and renders the display region
// - Scrape: bulk detail fetch and CSV export
// - Demo (axum): in-process fake registry for demo mode and tests

pub mod binder;
pub mod cli;
pub mod config;
pub mod demo;
pub mod dispatch;
pub mod logging;
pub mod markup;
pub mod page;
pub mod registry;
pub mod scrape;
pub mod tui;
