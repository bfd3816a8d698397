//! Explicit logging interface handed to every component.
//!
//! Components never reach for a global logger directly; they report through a
//! `ReorgObserver`. [`LogObserver`] forwards to the `log` facade, and
//! [`RecordingObserver`] keeps events in memory for tests and audits.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Severity of an observed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<EventLevel> for log::Level {
    fn from(level: EventLevel) -> Self {
        match level {
            EventLevel::Debug => log::Level::Debug,
            EventLevel::Info => log::Level::Info,
            EventLevel::Warn => log::Level::Warn,
            EventLevel::Error => log::Level::Error,
        }
    }
}

/// Receiver for component diagnostics
pub trait ReorgObserver: Send + Sync {
    /// Handle one event from `component`
    fn event(&self, level: EventLevel, component: &'static str, message: &str);

    fn debug(&self, component: &'static str, message: &str) {
        self.event(EventLevel::Debug, component, message);
    }

    fn info(&self, component: &'static str, message: &str) {
        self.event(EventLevel::Info, component, message);
    }

    fn warn(&self, component: &'static str, message: &str) {
        self.event(EventLevel::Warn, component, message);
    }

    fn error(&self, component: &'static str, message: &str) {
        self.event(EventLevel::Error, component, message);
    }
}

/// Shared observer handle
pub type SharedObserver = Arc<dyn ReorgObserver>;

/// Forwards events to the `log` facade, using the component as log target
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ReorgObserver for LogObserver {
    fn event(&self, level: EventLevel, component: &'static str, message: &str) {
        log::log!(target: component, level.into(), "{}", message);
    }
}

/// Default observer for components constructed without one
pub fn default_observer() -> SharedObserver {
    Arc::new(LogObserver)
}

/// One captured event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEvent {
    pub level: EventLevel,
    pub component: String,
    pub message: String,
}

/// Keeps every event in memory, optionally forwarding to another observer
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
    forward: Option<SharedObserver>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and also pass events on to `inner`
    pub fn forwarding(inner: SharedObserver) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            forward: Some(inner),
        }
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    /// Messages at `level` or above
    pub fn messages_at_least(&self, level: EventLevel) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| rank(e.level) >= rank(level))
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages_at_least(EventLevel::Warn)
    }

    /// Whether any event message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.events.lock().iter().any(|e| e.message.contains(needle))
    }
}

fn rank(level: EventLevel) -> u8 {
    match level {
        EventLevel::Debug => 0,
        EventLevel::Info => 1,
        EventLevel::Warn => 2,
        EventLevel::Error => 3,
    }
}

impl ReorgObserver for RecordingObserver {
    fn event(&self, level: EventLevel, component: &'static str, message: &str) {
        self.events.lock().push(ObservedEvent {
            level,
            component: component.to_string(),
            message: message.to_string(),
        });
        if let Some(inner) = &self.forward {
            inner.event(level, component, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_filters() {
        let observer = RecordingObserver::new();
        observer.debug("planner", "scanning");
        observer.warn("executor", "source vanished: Inbox/a.md");
        observer.error("backup", "emergency backup failed");

        assert_eq!(observer.events().len(), 3);
        assert_eq!(observer.warnings().len(), 2);
        assert!(observer.contains("source vanished"));
        assert!(!observer.contains("nothing like this"));
    }

    #[test]
    fn test_forwarding() {
        let inner = Arc::new(RecordingObserver::new());
        let outer = RecordingObserver::forwarding(inner.clone());
        outer.info("scanner", "done");
        assert_eq!(inner.events().len(), 1);
    }
}
