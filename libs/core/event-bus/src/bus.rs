//! The synchronous event bus and its event envelope.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{FailureKind, HandlerFailure, PublishError};
use crate::metrics::BusMetrics;
use crate::registry::{BusEvent, Handler};

/// An event as delivered to handlers.
///
/// Built by [`EventBus::publish`] for every call and dropped once the last
/// handler returns; the bus keeps no history.
#[derive(Debug, Clone)]
pub struct Event<E: BusEvent> {
    /// Unique id of this publication
    pub id: Uuid,
    /// Topic the event was routed under
    pub topic: E::Topic,
    /// When `publish` was called
    pub published_at: DateTime<Utc>,
    /// The payload
    pub payload: E,
}

impl<E: BusEvent> Event<E> {
    /// Wrap a payload, stamping a fresh id and the current time.
    pub fn new(payload: E) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: payload.topic(),
            published_at: Utc::now(),
            payload,
        }
    }
}

/// Outcome of a single `publish` call
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Id of the published event
    pub event_id: Uuid,
    /// Topic name
    pub topic: String,
    /// Number of handlers registered for the topic at publish time
    pub subscribers: usize,
    /// Number of handlers that completed successfully
    pub delivered: usize,
    /// Handlers that returned an error or panicked, in invocation order
    pub failures: Vec<HandlerFailure>,
}

impl PublishReport {
    /// Whether every handler succeeded (trivially true with no subscribers)
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert into a `Result`, yielding the delivered count on success.
    pub fn into_result(self) -> Result<usize, PublishError> {
        if self.failures.is_empty() {
            Ok(self.delivered)
        } else {
            Err(PublishError::HandlersFailed {
                topic: self.topic,
                total: self.subscribers,
                failures: self.failures,
            })
        }
    }
}

/// Synchronous publish/subscribe router.
///
/// # Delivery
///
/// `publish` invokes every handler registered for the event's topic, in
/// registration order, on the calling thread, and returns only after the
/// last one finishes. Ordering is guaranteed within a topic's subscriber
/// list only.
///
/// Registering the same handler twice makes it fire twice.
///
/// # Isolation
///
/// Each invocation runs inside its own error boundary. A handler that
/// returns `Err` or panics is logged and recorded in the [`PublishReport`],
/// and the next handler still runs.
pub struct EventBus<E: BusEvent> {
    subscribers: HashMap<E::Topic, Vec<Arc<dyn Handler<E>>>>,
    metrics: BusMetrics,
}

impl<E: BusEvent> EventBus<E> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::with_metrics(BusMetrics::default())
    }

    /// Create an empty bus whose metrics carry the given `bus` label.
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_metrics(BusMetrics::new(name))
    }

    /// Create an empty bus with a custom metrics helper.
    pub fn with_metrics(metrics: BusMetrics) -> Self {
        Self {
            subscribers: HashMap::new(),
            metrics,
        }
    }

    /// Register `handler` for `topic`.
    ///
    /// There is no matching unsubscribe: the subscription lives as long as
    /// the bus.
    pub fn subscribe<H>(&mut self, topic: E::Topic, handler: H)
    where
        H: Handler<E> + 'static,
    {
        self.subscribe_arc(topic, Arc::new(handler));
    }

    /// Register an already shared handler for `topic`.
    pub fn subscribe_arc(&mut self, topic: E::Topic, handler: Arc<dyn Handler<E>>) {
        debug!(
            bus = %self.metrics.bus_name(),
            topic = %topic,
            handler = handler.name(),
            "Subscribing handler"
        );
        self.subscribers.entry(topic).or_default().push(handler);
    }

    /// Number of handlers registered for `topic`.
    pub fn subscriber_count(&self, topic: E::Topic) -> usize {
        self.subscribers.get(&topic).map_or(0, Vec::len)
    }

    /// Topics with at least one handler.
    pub fn topics(&self) -> impl Iterator<Item = E::Topic> + '_ {
        self.subscribers.keys().copied()
    }

    /// Publish `payload` to every handler registered for its topic.
    ///
    /// Publishing to a topic without subscribers is a no-op that returns a
    /// clean, empty report.
    pub fn publish(&self, payload: E) -> PublishReport {
        let event = Event::new(payload);
        let topic = event.topic.to_string();
        self.metrics.event_published(&topic);

        let handlers = self
            .subscribers
            .get(&event.topic)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if handlers.is_empty() {
            trace!(topic = %topic, event_id = %event.id, "No subscribers for topic");
            self.metrics.event_unrouted(&topic);
        }

        let mut delivered = 0;
        let mut failures = Vec::new();

        for (position, handler) in handlers.iter().enumerate() {
            let name = handler.name();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&event)));

            let kind = match outcome {
                Ok(Ok(())) => {
                    delivered += 1;
                    self.metrics.handler_succeeded(&topic, name);
                    continue;
                }
                Ok(Err(err)) => FailureKind::Error(err),
                Err(panic) => FailureKind::Panicked(panic_message(panic.as_ref())),
            };

            warn!(
                topic = %topic,
                event_id = %event.id,
                handler = name,
                position,
                error = %kind,
                "Event handler failed, continuing with remaining handlers"
            );
            self.metrics.handler_failed(&topic, name, kind.label());
            failures.push(HandlerFailure {
                handler: name,
                position,
                kind,
            });
        }

        debug!(
            topic = %topic,
            event_id = %event.id,
            delivered,
            failed = failures.len(),
            "Event published"
        );

        PublishReport {
            event_id: event.id,
            topic,
            subscribers: handlers.len(),
            delivered,
            failures,
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subscriptions: Vec<(String, Vec<&'static str>)> = self
            .subscribers
            .iter()
            .map(|(topic, handlers)| {
                (
                    topic.to_string(),
                    handlers.iter().map(|h| h.name()).collect(),
                )
            })
            .collect();
        subscriptions.sort();

        f.debug_struct("EventBus")
            .field("bus", &self.metrics.bus_name())
            .field("subscriptions", &subscriptions)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
