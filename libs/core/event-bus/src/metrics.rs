//! Metrics for the event bus
//!
//! Emitted through the `metrics` facade. Nothing is recorded unless the host
//! application installs a recorder.

use metrics::counter;

/// Event bus metrics helper
#[derive(Debug, Clone)]
pub struct BusMetrics {
    /// Bus name for labeling
    bus_name: String,
}

impl BusMetrics {
    /// Create new BusMetrics
    pub fn new(bus_name: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
        }
    }

    /// Bus name used as the `bus` label
    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    /// Record an event being published
    pub fn event_published(&self, topic: &str) {
        counter!(
            "event_bus_events_published_total",
            "bus" => self.bus_name.clone(),
            "topic" => topic.to_string()
        )
        .increment(1);
    }

    /// Record an event published to a topic nobody listens on
    pub fn event_unrouted(&self, topic: &str) {
        counter!(
            "event_bus_events_unrouted_total",
            "bus" => self.bus_name.clone(),
            "topic" => topic.to_string()
        )
        .increment(1);
    }

    /// Record a handler completing successfully
    pub fn handler_succeeded(&self, topic: &str, handler: &'static str) {
        counter!(
            "event_bus_handler_invocations_total",
            "bus" => self.bus_name.clone(),
            "topic" => topic.to_string(),
            "handler" => handler,
            "status" => "success"
        )
        .increment(1);
    }

    /// Record a handler failing (`kind` is `error` or `panic`)
    pub fn handler_failed(&self, topic: &str, handler: &'static str, kind: &'static str) {
        counter!(
            "event_bus_handler_invocations_total",
            "bus" => self.bus_name.clone(),
            "topic" => topic.to_string(),
            "handler" => handler,
            "status" => kind
        )
        .increment(1);
    }
}

impl Default for BusMetrics {
    fn default() -> Self {
        Self::new("default")
    }
}
