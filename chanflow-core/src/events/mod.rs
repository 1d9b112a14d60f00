//! Engine events and the aggregator the workflow waits on.
//!
//! # Event Flow
//!
//! 1. The channel engine raises an [`Event`] on its own thread and hands it
//!    to its [`EventHandler`](crate::engine::EventHandler)
//! 2. [`EventAggregator`] buffers it and wakes every waiter
//! 3. The workflow's `await_at_least(n)` returns the drained buffer and the
//!    workflow decides its next step from the event tags

pub mod aggregator;
pub mod types;

pub use aggregator::EventAggregator;
pub use types::{ChannelId, ClosureReason, Event, EventKind, PaymentHash, PaymentId, RouteHop};
