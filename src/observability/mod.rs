//! Observability for the engine
//!
//! - structured JSON log lines
//! - monotonic counters
//! - a fixed set of engine events
//!
//! Observability is read-only: nothing here feeds back into a tick.
//!
//! ```ignore
//! use afdd_core::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::RuleTrapped, &[("rule", "R3")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_rules_trapped();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its own severity.
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::EngineWired);
        log_event_with_fields(Event::ConfigLoaded, &[("path", "/tmp/engine.json")]);
    }
}
