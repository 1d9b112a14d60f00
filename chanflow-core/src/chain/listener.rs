//! Block listeners and their ordered fan-out.
//!
//! Connects go out in registration order, disconnects in reverse. A layer
//! registered after its dependency therefore learns about a new block after
//! the dependency did, and unwinds a stale block before the dependency does.

use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Error reported by a single listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Something that tracks the chain block by block.
pub trait BlockListener: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn block_connected(&self, block: &[u8], height: u32) -> Result<(), ListenerError>;

    fn block_disconnected(&self, header: &[u8], height: u32) -> Result<(), ListenerError>;
}

/// A listener that failed during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub listener: String,
    pub error: ListenerError,
}

/// Outcome of delivering one notification to every listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that accepted the notification.
    pub delivered: usize,
    pub failures: Vec<ListenerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered set of block listeners.
#[derive(Default)]
pub struct ListenerMultiplexer {
    listeners: RwLock<Vec<Arc<dyn BlockListener>>>,
}

impl ListenerMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Vec<Arc<dyn BlockListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Append a listener. Returns `false` if this exact listener is already
    /// registered.
    pub fn register(&self, listener: Arc<dyn BlockListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            debug!(listener = listener.name(), "Listener already registered");
            return false;
        }
        debug!(listener = listener.name(), position = listeners.len(), "Registered block listener");
        listeners.push(listener);
        true
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unregister(&self, listener: &Arc<dyn BlockListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() < before
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a connected block to every listener, in registration order.
    pub fn dispatch_connect(&self, block: &[u8], height: u32) -> DispatchReport {
        let listeners = self.snapshot();
        deliver(listeners.iter(), "connect", height, |l| {
            l.block_connected(block, height)
        })
    }

    /// Deliver a disconnected block to every listener, last-registered first.
    pub fn dispatch_disconnect(&self, header: &[u8], height: u32) -> DispatchReport {
        let listeners = self.snapshot();
        deliver(listeners.iter().rev(), "disconnect", height, |l| {
            l.block_disconnected(header, height)
        })
    }
}

fn deliver<'a, I, F>(listeners: I, kind: &'static str, height: u32, call: F) -> DispatchReport
where
    I: Iterator<Item = &'a Arc<dyn BlockListener>>,
    F: Fn(&dyn BlockListener) -> Result<(), ListenerError>,
{
    let mut report = DispatchReport::default();
    for listener in listeners {
        match call(listener.as_ref()) {
            Ok(()) => report.delivered += 1,
            Err(error) => {
                warn!(
                    listener = listener.name(),
                    height,
                    kind,
                    error = %error,
                    "Block listener failed"
                );
                report.failures.push(ListenerFailure {
                    listener: listener.name().to_string(),
                    error,
                });
            }
        }
    }
    report
}

/// Multiplexers nest: a child multiplexer is one listener of its parent.
impl BlockListener for ListenerMultiplexer {
    fn name(&self) -> &str {
        "multiplexer"
    }

    fn block_connected(&self, block: &[u8], height: u32) -> Result<(), ListenerError> {
        into_result(self.dispatch_connect(block, height))
    }

    fn block_disconnected(&self, header: &[u8], height: u32) -> Result<(), ListenerError> {
        into_result(self.dispatch_disconnect(header, height))
    }
}

fn into_result(report: DispatchReport) -> Result<(), ListenerError> {
    if report.is_clean() {
        return Ok(());
    }
    let failed: Vec<String> = report
        .failures
        .iter()
        .map(|f| format!("{}: {}", f.listener, f.error))
        .collect();
    Err(ListenerError(failed.join("; ")))
}
