//! Delayed and throttled event binding
//!
//! Wraps a handler so a burst of events collapses into fewer invocations:
//!
//! - **Debounce** (default): every event cancels the pending call and
//!   schedules a new one `delay` later. The handler runs once the events
//!   stop, with the context of the last one.
//! - **Throttle**: an event arriving more than `delay` after the previous
//!   execution runs the handler immediately. Anything sooner becomes the
//!   single trailing call, replaced by each newer event, so the last event
//!   of a burst is never dropped.
//!
//! Timers are tokio tasks, so triggering must happen inside a runtime.

use crate::dispatch::{BindError, Dispatcher, EventContext, Handler};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How a delayed handler coalesces events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayMode {
    #[default]
    Debounce,
    Throttle,
}

impl DelayMode {
    pub fn from_throttle(throttle: bool) -> Self {
        if throttle {
            Self::Throttle
        } else {
            Self::Debounce
        }
    }
}

/// Validate a delay given in milliseconds
pub fn delay_from_millis(ms: i64) -> Result<Duration, BindError> {
    if ms <= 0 {
        return Err(BindError::NonPositiveDelay(ms));
    }
    Ok(Duration::from_millis(ms as u64))
}

/// The single outstanding deferred call for one bound handler
#[derive(Default)]
struct PendingInvocation {
    wait: Option<JoinHandle<()>>,
    last_exec: Option<Instant>,
    /// Bumped whenever `wait` is replaced; a timer that lost the race
    /// against a newer event sees a stale generation and does nothing
    generation: u64,
}

impl PendingInvocation {
    fn cancel(&mut self) {
        if let Some(wait) = self.wait.take() {
            wait.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

/// A handler wrapped with debounce or throttle behaviour
///
/// Cloning shares the pending state, so all clones coalesce together.
pub struct Delayed<A> {
    handler: Arc<dyn Fn(A) + Send + Sync>,
    state: Arc<Mutex<PendingInvocation>>,
    delay: Duration,
    mode: DelayMode,
}

impl<A> Clone for Delayed<A> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            state: self.state.clone(),
            delay: self.delay,
            mode: self.mode,
        }
    }
}

impl<A: Send + 'static> Delayed<A> {
    pub fn new(
        delay: Duration,
        mode: DelayMode,
        handler: impl Fn(A) + Send + Sync + 'static,
    ) -> Result<Self, BindError> {
        if delay.is_zero() {
            return Err(BindError::NonPositiveDelay(0));
        }
        Ok(Self {
            handler: Arc::new(handler),
            state: Arc::new(Mutex::new(PendingInvocation::default())),
            delay,
            mode,
        })
    }

    fn lock(&self) -> MutexGuard<'_, PendingInvocation> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Feed one event occurrence through the delay policy
    pub fn trigger(&self, args: A) {
        let now = Instant::now();
        let mut state = self.lock();

        // Never executed counts as an unbounded quiet period
        let quiet = state
            .last_exec
            .map(|last| now.saturating_duration_since(last) > self.delay)
            .unwrap_or(true);

        if self.mode == DelayMode::Throttle && quiet {
            state.cancel();
            state.last_exec = Some(now);
            drop(state);
            (self.handler)(args);
            return;
        }

        state.cancel();
        let generation = state.generation;
        let handler = self.handler.clone();
        let shared = self.state.clone();
        let delay = self.delay;

        state.wait = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
                if state.generation != generation {
                    return;
                }
                state.wait = None;
                state.last_exec = Some(Instant::now());
            }
            handler(args);
        }));
    }

    /// Drop the pending call, if any
    pub fn cancel(&self) {
        self.lock().cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.lock().wait.is_some()
    }
}

/// Options for a delayed binding, replacing positional argument juggling
pub struct DelayedBinding {
    /// Space-separated event names
    pub events: String,
    /// Delegation selector matched at dispatch time
    pub selector: Option<String>,
    /// Payload handed to the handler with every event
    pub data: Option<Value>,
    pub handler: Handler,
    pub delay: Duration,
    pub throttle: bool,
}

impl DelayedBinding {
    pub fn new(events: impl Into<String>, delay: Duration, handler: Handler) -> Self {
        Self {
            events: events.into(),
            selector: None,
            data: None,
            handler,
            delay,
            throttle: false,
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn throttle(mut self, throttle: bool) -> Self {
        self.throttle = throttle;
        self
    }
}

/// Registration of delayed handlers on an event target
pub trait BindWithDelay {
    fn bind_with_delay(&mut self, binding: DelayedBinding) -> Result<&mut Self, BindError>;
}

impl BindWithDelay for Dispatcher {
    fn bind_with_delay(&mut self, binding: DelayedBinding) -> Result<&mut Self, BindError> {
        let DelayedBinding {
            events,
            selector,
            data,
            handler,
            delay,
            throttle,
        } = binding;

        let mode = DelayMode::from_throttle(throttle);
        let delayed = Delayed::new(delay, mode, move |ctx: EventContext| handler(ctx))?;
        tracing::debug!(events = %events, ?mode, delay_ms = delay.as_millis() as u64, "Delayed binding");

        self.on(
            &events,
            selector.as_deref(),
            data,
            Arc::new(move |ctx: EventContext| delayed.trigger(ctx)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Element, Event};
    use tokio::time::sleep;

    fn recording<A: Send + 'static>(
        delay_ms: u64,
        mode: DelayMode,
    ) -> (Delayed<A>, Arc<Mutex<Vec<A>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let delayed = Delayed::new(Duration::from_millis(delay_ms), mode, move |a| {
            sink.lock().unwrap().push(a)
        })
        .unwrap();
        (delayed, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_fires_once_with_last_arguments() {
        let (delayed, calls) = recording(200, DelayMode::Debounce);

        for i in 1..=5 {
            delayed.trigger(i);
            sleep(Duration::from_millis(50)).await;
        }
        assert!(calls.lock().unwrap().is_empty());
        assert!(delayed.is_pending());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(*calls.lock().unwrap(), vec![5]);
        assert!(!delayed.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_waits_for_quiet_after_last_event() {
        let (delayed, calls) = recording(200, DelayMode::Debounce);

        delayed.trigger("a");
        sleep(Duration::from_millis(150)).await;
        delayed.trigger("b");
        // 300ms after the first event, but only 150ms after the last
        sleep(Duration::from_millis(150)).await;
        assert!(calls.lock().unwrap().is_empty());

        sleep(Duration::from_millis(60)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_fire_separately() {
        let (delayed, calls) = recording(100, DelayMode::Debounce);

        delayed.trigger(1);
        sleep(Duration::from_millis(150)).await;
        delayed.trigger(2);
        sleep(Duration::from_millis(150)).await;
        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_runs_first_event_immediately() {
        let (delayed, calls) = recording(100, DelayMode::Throttle);

        delayed.trigger("first");
        assert_eq!(*calls.lock().unwrap(), vec!["first"]);
        assert!(!delayed.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_keeps_one_trailing_call_with_newest_arguments() {
        let (delayed, calls) = recording(100, DelayMode::Throttle);

        delayed.trigger("a"); // t=0, immediate
        sleep(Duration::from_millis(30)).await;
        delayed.trigger("b"); // t=30, deferred
        sleep(Duration::from_millis(30)).await;
        delayed.trigger("c"); // t=60, replaces b
        assert_eq!(*calls.lock().unwrap(), vec!["a"]);

        sleep(Duration::from_millis(250)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["a", "c"]);

        // Quiet period elapsed since the trailing call: immediate again
        delayed.trigger("d");
        assert_eq!(*calls.lock().unwrap(), vec!["a", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_immediate_call_drops_stale_trailing_call() {
        let (delayed, calls) = recording(100, DelayMode::Throttle);

        delayed.trigger(1); // t=0 immediate
        sleep(Duration::from_millis(90)).await;
        delayed.trigger(2); // t=90 deferred to t=190
        sleep(Duration::from_millis(20)).await;
        delayed.trigger(3); // t=110, elapsed 110 > 100: immediate
        sleep(Duration::from_millis(300)).await;

        assert_eq!(*calls.lock().unwrap(), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_call() {
        let (delayed, calls) = recording(100, DelayMode::Debounce);
        delayed.trigger(1);
        delayed.cancel();
        sleep(Duration::from_millis(200)).await;
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn rejects_non_positive_delays() {
        assert_eq!(delay_from_millis(0), Err(BindError::NonPositiveDelay(0)));
        assert_eq!(delay_from_millis(-5), Err(BindError::NonPositiveDelay(-5)));
        assert_eq!(delay_from_millis(200), Ok(Duration::from_millis(200)));

        let result = Delayed::new(Duration::ZERO, DelayMode::Debounce, |_: ()| {});
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dispatcher_binding_debounces_keyups() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Handler = Arc::new(move |ctx: EventContext| {
            sink.lock()
                .unwrap()
                .push(ctx.current_target.value.unwrap_or_default())
        });

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .bind_with_delay(
                DelayedBinding::new("keyup", Duration::from_millis(200), handler)
                    .selector("#HOAsearch"),
            )
            .unwrap();

        for text in ["S", "Sm", "Smi", "Smith"] {
            let input = Element::new("input").with_id("HOAsearch").with_value(text);
            assert_eq!(dispatcher.dispatch(&Event::keyup(input)), 1);
            sleep(Duration::from_millis(40)).await;
        }
        sleep(Duration::from_millis(250)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["Smith".to_string()]);
    }

    #[test]
    fn dispatcher_binding_rejects_zero_delay() {
        let mut dispatcher = Dispatcher::new();
        let handler: Handler = Arc::new(|_: EventContext| {});
        let result =
            dispatcher.bind_with_delay(DelayedBinding::new("keyup", Duration::ZERO, handler));
        assert!(result.is_err());
        assert_eq!(dispatcher.listener_count(), 0);
    }
}
