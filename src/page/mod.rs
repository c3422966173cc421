// Lookup page - wires page events to registry requests
//
// The page is a set of independent mappings bound on one dispatcher:
// - keyup on the search box (debounced) -> search
// - click on a row's view link (delegated) -> load entity
// - click on the list button -> list all
// - click on the injected return button -> navigate away
//
// The page holds no registry data. Every response is rendered verbatim into
// the injected display region, and the host (TUI or tests) supplies the
// notifier, navigator and chrome handles.

pub mod display;
pub mod handlers;

pub use display::{DisplayContent, DisplayRegion, SharedDisplay, SharedRegion};
pub use handlers::{
    parse_identifier, EntityLoader, InvalidIdentifier, ListHandler, NavigationHandler,
    SearchHandler, LOADING_MESSAGE, SEARCHING_MESSAGE, SEARCH_INSTRUCTIONS,
};

use crate::binder::{BindWithDelay, DelayedBinding};
use crate::dispatch::{BindError, Dispatcher, Element, EventContext};
use crate::registry::SharedTransport;
use std::sync::Arc;
use std::time::Duration;

/// Selectors the page binds against
pub mod selectors {
    pub const SEARCH_INPUT: &str = "#HOAsearch";
    pub const VIEW_LINK: &str = ".link-view";
    pub const LIST_BUTTON: &str = "#btnList";
    pub const RETURN_BUTTON: &str = "#btnHOAwebsite";
    pub const CHROME_WRAPPER: &str = ".utds-citizen-experience-wrapper";
}

pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_RETURN_URL: &str = "https://commerce.utah.gov/hoa/";
pub const RETURN_LABEL: &str = "Return to HOA Website";

/// Blocking user-facing notification
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Leaves the page for another location
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// A control injected into the page chrome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub element: Element,
    pub label: String,
}

/// Page furniture outside the display region
pub trait PageChrome: Send + Sync {
    fn focus(&self, selector: &str);
    fn append_control(&self, container: &str, control: Control);
}

pub type SharedNotifier = Arc<dyn Notifier>;
pub type SharedNavigator = Arc<dyn Navigator>;
pub type SharedChrome = Arc<dyn PageChrome>;

/// Handles the page is built from
#[derive(Clone)]
pub struct PageServices {
    pub transport: SharedTransport,
    pub display: SharedRegion,
    pub notifier: SharedNotifier,
    pub navigator: SharedNavigator,
    pub chrome: SharedChrome,
}

/// Tunables for the page
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub search_delay: Duration,
    pub return_url: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            search_delay: DEFAULT_SEARCH_DELAY,
            return_url: DEFAULT_RETURN_URL.to_string(),
        }
    }
}

/// The assembled lookup page
pub struct LookupPage {
    search: SearchHandler,
    loader: EntityLoader,
    list: ListHandler,
    navigation: NavigationHandler,
    chrome: SharedChrome,
    search_delay: Duration,
}

impl LookupPage {
    pub fn new(services: PageServices, settings: PageSettings) -> Self {
        let PageServices {
            transport,
            display,
            notifier,
            navigator,
            chrome,
        } = services;

        Self {
            search: SearchHandler::new(transport.clone(), display.clone()),
            loader: EntityLoader::new(transport.clone(), display.clone(), notifier),
            list: ListHandler::new(transport, display),
            navigation: NavigationHandler::new(navigator, settings.return_url),
            chrome,
            search_delay: settings.search_delay,
        }
    }

    pub fn search(&self) -> &SearchHandler {
        &self.search
    }

    pub fn list(&self) -> &ListHandler {
        &self.list
    }

    /// Bind every page handler on `dispatcher`
    pub fn mount(&self, dispatcher: &mut Dispatcher) -> Result<(), BindError> {
        let search = self.search.clone();
        dispatcher.bind_with_delay(
            DelayedBinding::new(
                "keyup",
                self.search_delay,
                Arc::new(move |ctx: EventContext| {
                    let query = ctx.current_target.value.unwrap_or_default();
                    search.handle(&query);
                }),
            )
            .selector(selectors::SEARCH_INPUT),
        )?;

        let loader = self.loader.clone();
        dispatcher.on(
            "click",
            Some(selectors::VIEW_LINK),
            None,
            Arc::new(move |ctx: EventContext| {
                let pid = ctx
                    .current_target
                    .closest("tr")
                    .and_then(|row| row.data("pid"));
                // Rejection is already surfaced through the notifier
                let _ = loader.handle(pid);
            }),
        )?;

        let list = self.list.clone();
        dispatcher.on(
            "click",
            Some(selectors::LIST_BUTTON),
            None,
            Arc::new(move |_: EventContext| {
                list.handle();
            }),
        )?;

        let navigation = self.navigation.clone();
        dispatcher.on(
            "click",
            Some(selectors::RETURN_BUTTON),
            None,
            Arc::new(move |_: EventContext| navigation.handle()),
        )?;

        tracing::debug!("Lookup page mounted ({} listeners)", dispatcher.listener_count());
        Ok(())
    }

    /// Page-ready hook: focus the search box and add the return control
    pub fn ready(&self) {
        self.chrome.focus(selectors::SEARCH_INPUT);
        self.chrome.append_control(
            selectors::CHROME_WRAPPER,
            Control {
                element: Element::new("button")
                    .with_id(&selectors::RETURN_BUTTON[1..])
                    .with_class("btn")
                    .with_class("float-right"),
                label: RETURN_LABEL.to_string(),
            },
        );
    }
}
