// Terminal side of the page's host handles
//
// The page raises alerts, moves focus, injects controls and navigates away
// through these traits. The TUI records the requests here and picks them up
// on its next tick.

use crate::page::{Control, Navigator, Notifier, PageChrome};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct HostState {
    alerts: VecDeque<String>,
    focused: Option<String>,
    controls: Vec<(String, Control)>,
    navigate_to: Option<String>,
}

#[derive(Debug, Default)]
pub struct TerminalHost {
    state: Mutex<HostState>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Oldest alert not yet shown
    pub fn take_alert(&self) -> Option<String> {
        self.lock().alerts.pop_front()
    }

    pub fn focused(&self) -> Option<String> {
        self.lock().focused.clone()
    }

    /// Injected control whose element has `id`
    pub fn control(&self, id: &str) -> Option<Control> {
        self.lock()
            .controls
            .iter()
            .find(|(_, c)| c.element.id.as_deref() == Some(id))
            .map(|(_, c)| c.clone())
    }

    pub fn take_navigation(&self) -> Option<String> {
        self.lock().navigate_to.take()
    }
}

impl Notifier for TerminalHost {
    fn alert(&self, message: &str) {
        self.lock().alerts.push_back(message.to_string());
    }
}

impl Navigator for TerminalHost {
    fn navigate(&self, url: &str) {
        self.lock().navigate_to = Some(url.to_string());
    }
}

impl PageChrome for TerminalHost {
    fn focus(&self, selector: &str) {
        self.lock().focused = Some(selector.to_string());
    }

    fn append_control(&self, container: &str, control: Control) {
        let mut state = self.lock();
        // Re-running ready must not duplicate the control
        state
            .controls
            .retain(|(_, c)| c.element.id.is_none() || c.element.id != control.element.id);
        state.controls.push((container.to_string(), control));
    }
}
