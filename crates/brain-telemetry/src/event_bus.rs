//! In-process pub/sub event bus (spec §4.9 "EventBus"), grounded on
//! `bantz.core.events.EventBus` — the teacher's own `astrid-events::EventBus`
//! is a typed-enum broadcast channel shaped for cross-task fan-out and
//! doesn't match this contract's string-pattern + middleware shape, so the
//! pattern matching, middleware chain, and fire-and-forget dispatch below
//! follow the original instead; the synchronized-state/logging idiom (a
//! single `Mutex`-guarded inner state, `tracing` at each lifecycle point)
//! still follows this workspace's crates (`brain-memory`, `brain-gating`).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// One message published on the bus (spec §3 `Event`).
#[derive(Debug, Clone)]
pub struct Event {
    /// Dotted event type, e.g. `"tool.executed"`.
    pub event_type: String,
    /// Event payload.
    pub data: Value,
    /// When it was published.
    pub timestamp: DateTime<Utc>,
    /// Publishing component, defaults to `"core"`.
    pub source: String,
    /// Run/turn correlation id, if any.
    pub correlation_id: Option<String>,
}

/// A synchronous subscriber callback.
pub type Handler = Box<dyn Fn(&Event) + Send + Sync>;
/// A synchronous middleware: transforms an event, or returns `None` to
/// suppress it entirely.
pub type Middleware = Box<dyn Fn(Event) -> Option<Event> + Send + Sync>;

struct State {
    subscribers: HashMap<String, Vec<Handler>>,
    global_subscribers: Vec<Handler>,
    middleware: Vec<Middleware>,
    history: VecDeque<Event>,
    history_size: usize,
}

/// Pub/sub bus with exact-match and prefix-wildcard (`x.*`) subscriptions.
///
/// Handlers are fire-and-forget: a panic inside one handler is caught so it
/// can never prevent the remaining handlers (or the publisher) from running.
pub struct EventBus {
    state: Mutex<State>,
}

impl EventBus {
    /// Build a bus retaining the last `history_size` published events.
    #[must_use]
    pub fn new(history_size: usize) -> Self {
        Self {
            state: Mutex::new(State {
                subscribers: HashMap::new(),
                global_subscribers: Vec::new(),
                middleware: Vec::new(),
                history: VecDeque::new(),
                history_size,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Subscribe to `pattern`: an exact event type, or a `"x.*"` prefix
    /// wildcard matching any `"x.<rest>"`.
    pub fn subscribe(&self, pattern: impl Into<String>, handler: Handler) {
        self.lock().subscribers.entry(pattern.into()).or_default().push(handler);
    }

    /// Subscribe to every event, regardless of type.
    pub fn subscribe_all(&self, handler: Handler) {
        self.lock().global_subscribers.push(handler);
    }

    /// Append a middleware to the processing chain. Middleware run in
    /// registration order before any handler is dispatched.
    pub fn add_middleware(&self, middleware: Middleware) {
        self.lock().middleware.push(middleware);
    }

    /// Publish an event, running middleware then dispatching to matching
    /// handlers. Returns the (possibly middleware-transformed) event, or
    /// `None` if a middleware suppressed it.
    pub fn publish(&self, event_type: impl Into<String>, data: Value, source: impl Into<String>, correlation_id: Option<String>) -> Option<Event> {
        let mut event =
            Event { event_type: event_type.into(), data, timestamp: Utc::now(), source: source.into(), correlation_id };

        {
            let state = self.lock();
            for mw in &state.middleware {
                match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| mw(event.clone()))) {
                    Ok(Some(next)) => event = next,
                    Ok(None) => return None,
                    Err(_) => {
                        tracing::error!(event_type = %event.event_type, "event bus middleware panicked");
                        return None;
                    }
                }
            }
        }

        let handlers = {
            let mut state = self.lock();
            state.history.push_back(event.clone());
            while state.history.len() > state.history_size {
                state.history.pop_front();
            }
            collect_handlers(&state, &event.event_type)
        };

        for handler in handlers {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(&event))).is_err() {
                tracing::error!(event_type = %event.event_type, "event bus handler panicked");
            }
        }

        Some(event)
    }

    /// Recent events from history, optionally filtered to one `event_type`,
    /// most-recent-last, capped at `limit`.
    #[must_use]
    pub fn get_history(&self, event_type: Option<&str>, limit: usize) -> Vec<Event> {
        let state = self.lock();
        let filtered: Vec<Event> = match event_type {
            Some(t) => state.history.iter().filter(|e| e.event_type == t).cloned().collect(),
            None => state.history.iter().cloned().collect(),
        };
        let start = filtered.len().saturating_sub(limit);
        filtered[start..].to_vec()
    }

    /// Clear retained history.
    pub fn clear_history(&self) {
        self.lock().history.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

fn collect_handlers<'s>(state: &'s State, event_type: &str) -> Vec<&'s Handler> {
    let mut handlers = Vec::new();
    if let Some(exact) = state.subscribers.get(event_type) {
        handlers.extend(exact.iter());
    }
    for (pattern, subs) in &state.subscribers {
        if let Some(prefix) = pattern.strip_suffix(".*") {
            if event_type.starts_with(prefix) && event_type[prefix.len()..].starts_with('.') {
                handlers.extend(subs.iter());
            }
        }
    }
    handlers.extend(state.global_subscribers.iter());
    handlers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn exact_match_subscriber_receives_event() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        bus.subscribe("tool.executed", Box::new(move |_| { counted.fetch_add(1, Ordering::SeqCst); }));
        bus.publish("tool.executed", Value::Null, "core", None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wildcard_prefix_subscriber_matches_any_suffix() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        bus.subscribe("tool.*", Box::new(move |_| { counted.fetch_add(1, Ordering::SeqCst); }));
        bus.publish("tool.executed", Value::Null, "core", None);
        bus.publish("tool.failed", Value::Null, "core", None);
        bus.publish("mail.received", Value::Null, "core", None);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn subscribe_all_receives_every_event() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        bus.subscribe_all(Box::new(move |_| { counted.fetch_add(1, Ordering::SeqCst); }));
        bus.publish("a", Value::Null, "core", None);
        bus.publish("b.c", Value::Null, "core", None);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn middleware_can_transform_event_data() {
        let bus = EventBus::default();
        bus.add_middleware(Box::new(|mut e| {
            e.data = Value::String("transformed".to_string());
            Some(e)
        }));
        let published = bus.publish("x", Value::Null, "core", None).unwrap();
        assert_eq!(published.data, Value::String("transformed".to_string()));
    }

    #[test]
    fn middleware_can_suppress_event() {
        let bus = EventBus::default();
        bus.add_middleware(Box::new(|_| None));
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        bus.subscribe_all(Box::new(move |_| { counted.fetch_add(1, Ordering::SeqCst); }));
        let published = bus.publish("x", Value::Null, "core", None);
        assert!(published.is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_panic_does_not_block_other_handlers() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        bus.subscribe_all(Box::new(|_| panic!("boom")));
        bus.subscribe_all(Box::new(move |_| { counted.fetch_add(1, Ordering::SeqCst); }));
        bus.publish("x", Value::Null, "core", None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn history_is_bounded_and_filterable() {
        let bus = EventBus::new(2);
        bus.publish("a", Value::Null, "core", None);
        bus.publish("b", Value::Null, "core", None);
        bus.publish("a", Value::Null, "core", None);
        assert_eq!(bus.get_history(None, 10).len(), 2);
        assert_eq!(bus.get_history(Some("a"), 10).len(), 1);
    }

    #[test]
    fn correlation_id_is_preserved_on_the_published_event() {
        let bus = EventBus::default();
        let published = bus.publish("run.started", Value::Null, "core", Some("run-1".to_string())).unwrap();
        assert_eq!(published.correlation_id.as_deref(), Some("run-1"));
    }
}
