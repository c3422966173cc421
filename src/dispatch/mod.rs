// Event dispatch - the "bind an event handler" primitive
//
// Listeners are registered against event names with an optional selector.
// Selectors are matched against the event target (or its ancestors) at
// dispatch time, so listeners apply to elements that did not exist yet when
// they were registered. This is how the page binds handlers to result rows
// that only appear after a search response is rendered.

pub mod element;

pub use element::{Element, Selector};

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// An event raised against a page element
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event type, e.g. "keyup" or "click"
    pub name: String,
    /// Element the event originated from
    pub target: Element,
}

impl Event {
    pub fn new(name: impl Into<String>, target: Element) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    pub fn click(target: Element) -> Self {
        Self::new("click", target)
    }

    pub fn keyup(target: Element) -> Self {
        Self::new("keyup", target)
    }
}

/// What a handler receives for each invocation
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub event: Event,
    /// Element the listener matched: the target itself, or the ancestor
    /// matching the delegation selector
    pub current_target: Element,
    /// Payload supplied at registration time
    pub data: Option<Value>,
}

/// Event handler callback
pub type Handler = Arc<dyn Fn(EventContext) + Send + Sync>;

/// Errors raised while registering a listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// No event names were given
    NoEvents,
    /// The delegation selector could not be parsed
    InvalidSelector(String),
    /// Delay must be a positive number of milliseconds
    NonPositiveDelay(i64),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEvents => write!(f, "No event names given"),
            Self::InvalidSelector(s) => write!(f, "Invalid selector: {:?}", s),
            Self::NonPositiveDelay(ms) => {
                write!(f, "Delay must be positive, got {} ms", ms)
            }
        }
    }
}

impl std::error::Error for BindError {}

struct Listener {
    event: String,
    selector: Option<Selector>,
    data: Option<Value>,
    handler: Handler,
}

/// Document-level event dispatcher
///
/// Listeners without a selector receive every event of their type.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<Listener>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for each space-separated name in `events`
    ///
    /// Returns the dispatcher for chaining.
    pub fn on(
        &mut self,
        events: &str,
        selector: Option<&str>,
        data: Option<Value>,
        handler: Handler,
    ) -> Result<&mut Self, BindError> {
        let names: Vec<&str> = events.split_whitespace().collect();
        if names.is_empty() {
            return Err(BindError::NoEvents);
        }

        let selector = match selector {
            Some(s) => {
                Some(Selector::parse(s).ok_or_else(|| BindError::InvalidSelector(s.to_string()))?)
            }
            None => None,
        };

        for name in names {
            tracing::trace!(event = name, "Listener registered");
            self.listeners.push(Listener {
                event: name.to_string(),
                selector: selector.clone(),
                data: data.clone(),
                handler: handler.clone(),
            });
        }

        Ok(self)
    }

    /// Remove every listener for the given space-separated event names
    pub fn off(&mut self, events: &str) -> &mut Self {
        let names: Vec<&str> = events.split_whitespace().collect();
        self.listeners.retain(|l| !names.contains(&l.event.as_str()));
        self
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every matching listener, in registration order
    ///
    /// Returns how many handlers were invoked.
    pub fn dispatch(&self, event: &Event) -> usize {
        let mut invoked = 0;

        for listener in self.listeners.iter().filter(|l| l.event == event.name) {
            let current_target = match &listener.selector {
                Some(selector) => match event.target.closest_matching(selector) {
                    Some(el) => el.clone(),
                    None => continue,
                },
                None => event.target.clone(),
            };

            (listener.handler)(EventContext {
                event: event.clone(),
                current_target,
                data: listener.data.clone(),
            });
            invoked += 1;
        }

        tracing::trace!(event = %event.name, invoked, "Event dispatched");
        invoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder() -> (Handler, Arc<Mutex<Vec<EventContext>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Handler = Arc::new(move |ctx: EventContext| sink.lock().unwrap().push(ctx));
        (handler, seen)
    }

    #[test]
    fn delegated_listener_matches_late_elements() {
        let mut dispatcher = Dispatcher::new();
        let (handler, seen) = recorder();
        dispatcher
            .on("click", Some(".link-view"), None, handler)
            .unwrap();

        // Row built after registration still matches
        let row = Element::new("tr").with_class("link-view").with_data("pid", "7");
        let cell = Element::new("td").within(row);
        assert_eq!(dispatcher.dispatch(&Event::click(cell)), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].current_target.tag, "tr");
        assert_eq!(seen[0].current_target.data("pid"), Some("7"));
        assert_eq!(seen[0].event.target.tag, "td");
    }

    #[test]
    fn unmatched_selector_and_event_name_are_skipped() {
        let mut dispatcher = Dispatcher::new();
        let (handler, seen) = recorder();
        dispatcher.on("click", Some("#btnList"), None, handler).unwrap();

        assert_eq!(dispatcher.dispatch(&Event::click(Element::new("button"))), 0);
        let list = Element::new("button").with_id("btnList");
        assert_eq!(dispatcher.dispatch(&Event::keyup(list)), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn multiple_event_names_and_data_payload() {
        let mut dispatcher = Dispatcher::new();
        let (handler, seen) = recorder();
        dispatcher
            .on("keyup change", None, Some(json!({"source": "test"})), handler)
            .unwrap();
        assert_eq!(dispatcher.listener_count(), 2);

        let input = Element::new("input");
        dispatcher.dispatch(&Event::keyup(input.clone()));
        dispatcher.dispatch(&Event::new("change", input));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].data, Some(json!({"source": "test"})));
    }

    #[test]
    fn on_chains_and_off_removes() {
        let mut dispatcher = Dispatcher::new();
        let (a, _) = recorder();
        let (b, _) = recorder();
        dispatcher
            .on("click", None, None, a)
            .unwrap()
            .on("keyup", None, None, b)
            .unwrap();
        assert_eq!(dispatcher.listener_count(), 2);

        dispatcher.off("click");
        assert_eq!(dispatcher.listener_count(), 1);
    }

    #[test]
    fn registration_errors() {
        let mut dispatcher = Dispatcher::new();
        let (handler, _) = recorder();
        assert!(matches!(
            dispatcher.on("  ", None, None, handler.clone()),
            Err(BindError::NoEvents)
        ));
        assert!(matches!(
            dispatcher.on("click", Some("tr td"), None, handler),
            Err(BindError::InvalidSelector(_))
        ));
    }
}
