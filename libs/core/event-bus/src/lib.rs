//! Event Bus
//!
//! A synchronous, in-process publish/subscribe router.
//!
//! ## Features
//!
//! - **Typed events**: `EventBus<E>` routes any payload type implementing `BusEvent`;
//!   the topic is derived from the payload, so a payload can never be published
//!   under the wrong topic
//! - **Ordered delivery**: handlers for a topic run in registration order,
//!   on the caller's thread, before `publish` returns
//! - **Handler isolation**: a handler returning an error or panicking is logged,
//!   counted and reported; the remaining handlers still run
//! - **Metrics**: publish and handler outcome counters via the `metrics` facade
//!
//! There is no unsubscribe, no queueing and no delayed delivery. Subscriptions
//! live as long as the bus that owns them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use event_bus::{BusEvent, EventBus, handler_fn};
//!
//! let mut bus = EventBus::<MyEvent>::new();
//! bus.subscribe(MyTopic::Created, handler_fn("audit", |event| {
//!     tracing::info!(event_id = %event.id, "seen");
//!     Ok(())
//! }));
//!
//! let report = bus.publish(MyEvent::Created { id: 1 });
//! assert!(report.is_clean());
//! ```

mod bus;
mod error;
pub mod metrics;
mod registry;

pub use bus::{Event, EventBus, PublishReport};
pub use error::{FailureKind, HandlerError, HandlerFailure, PublishError};
pub use metrics::BusMetrics;
pub use registry::{BusEvent, Handler, HandlerFn, handler_fn};
