//! Event and handler traits.
//!
//! This module provides:
//! - `BusEvent` trait for payload types routed by the bus
//! - `Handler` trait for subscribers
//! - `HandlerFn` adapter for closures

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::bus::Event;
use crate::error::HandlerError;

/// Payload type routed by an [`EventBus`](crate::EventBus).
///
/// Each domain defines one enum with a variant per topic and implements this
/// trait to map a variant to its topic. Deriving the topic from the payload
/// keeps payload shape and topic name in lockstep.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
/// enum OrderTopic { Placed, Shipped }
///
/// #[derive(Debug, Clone)]
/// enum OrderEvent { Placed { id: u64 }, Shipped { id: u64 } }
///
/// impl BusEvent for OrderEvent {
///     type Topic = OrderTopic;
///
///     fn topic(&self) -> OrderTopic {
///         match self {
///             OrderEvent::Placed { .. } => OrderTopic::Placed,
///             OrderEvent::Shipped { .. } => OrderTopic::Shipped,
///         }
///     }
/// }
/// ```
pub trait BusEvent: Clone + fmt::Debug + Send + Sync + 'static {
    /// Topic identifier used as the routing key.
    type Topic: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// The topic this payload is published under.
    fn topic(&self) -> Self::Topic;
}

/// A subscriber registered on a topic.
///
/// Handlers run synchronously inside `publish`. Handlers that keep state use
/// interior mutability; the bus only ever holds a shared reference.
pub trait Handler<E: BusEvent>: Send + Sync {
    /// Process one event.
    ///
    /// Return `Err` to report a failure. The bus logs it and moves on to the
    /// next handler.
    fn handle(&self, event: &Event<E>) -> Result<(), HandlerError>;

    /// Handler name for logs, metrics and publish reports.
    fn name(&self) -> &'static str;
}

/// Adapter turning a closure into a named [`Handler`].
pub struct HandlerFn<E, F> {
    name: &'static str,
    func: F,
    _event: PhantomData<fn(E)>,
}

impl<E, F> fmt::Debug for HandlerFn<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").field("name", &self.name).finish()
    }
}

/// Wrap a closure as a handler with the given name.
pub fn handler_fn<E, F>(name: &'static str, func: F) -> HandlerFn<E, F>
where
    E: BusEvent,
    F: Fn(&Event<E>) -> Result<(), HandlerError> + Send + Sync,
{
    HandlerFn {
        name,
        func,
        _event: PhantomData,
    }
}

impl<E, F> Handler<E> for HandlerFn<E, F>
where
    E: BusEvent,
    F: Fn(&Event<E>) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event<E>) -> Result<(), HandlerError> {
        (self.func)(event)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
