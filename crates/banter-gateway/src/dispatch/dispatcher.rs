//! Event dispatcher
//!
//! Owns the listener registry and drives each decoded frame through the
//! built-in bookkeeping table, waiter resolution, and listener fan-out, in
//! that order. Listeners run as detached tasks; their failures are logged
//! and contained.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use banter_cache::CacheStore;
use banter_common::error::AppResult;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error};

use super::{handlers, WaiterRegistry};
use crate::error::GatewayError;
use crate::events::{Event, EventType};

/// An asynchronous event listener
///
/// Registered listeners are invoked once per matching event, each
/// invocation in its own task. An `Err` return or a panic is logged and
/// never reaches other listeners or the connection.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn call(&self, event: Event) -> AppResult<()>;
}

type BoxedHandler = Box<dyn Fn(Event) -> BoxFuture<'static, AppResult<()>> + Send + Sync>;

/// Adapter turning a plain async closure into an [`EventListener`]
struct FnListener {
    handler: BoxedHandler,
}

#[async_trait]
impl EventListener for FnListener {
    async fn call(&self, event: Event) -> AppResult<()> {
        (self.handler)(event).await
    }
}

/// Routes decoded dispatch frames to bookkeeping, waiters, and listeners
pub struct Dispatcher {
    cache: Arc<CacheStore>,
    waiters: Arc<WaiterRegistry>,
    listeners: DashMap<EventType, Vec<Arc<dyn EventListener>>>,
}

impl Dispatcher {
    /// Create a dispatcher over the given cache and waiter registry
    #[must_use]
    pub fn new(cache: Arc<CacheStore>, waiters: Arc<WaiterRegistry>) -> Self {
        Self {
            cache,
            waiters,
            listeners: DashMap::new(),
        }
    }

    /// Create a dispatcher behind an `Arc`
    #[must_use]
    pub fn new_shared(cache: Arc<CacheStore>, waiters: Arc<WaiterRegistry>) -> Arc<Self> {
        Arc::new(Self::new(cache, waiters))
    }

    /// Register a listener for an event type
    ///
    /// Listeners accumulate: registering a second listener for the same
    /// event type keeps both.
    pub fn register(&self, event_type: EventType, listener: Arc<dyn EventListener>) {
        self.listeners.entry(event_type).or_default().push(listener);
        debug!(event = %event_type, "Listener registered");
    }

    /// Register a plain async closure as a listener
    pub fn on<F, Fut>(&self, event_type: EventType, handler: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = AppResult<()>> + Send + 'static,
    {
        let handler: BoxedHandler = Box::new(move |event| handler(event).boxed());
        self.register(event_type, Arc::new(FnListener { handler }));
    }

    /// Number of listeners registered for an event type
    #[must_use]
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.listeners.get(&event_type).map_or(0, |l| l.len())
    }

    /// Decode and dispatch one event
    ///
    /// Built-in bookkeeping runs first so listeners observe an
    /// already-updated cache; waiters resolve next; listeners are then
    /// spawned as detached tasks. Returns the decoded event.
    pub fn dispatch(&self, event_type: EventType, data: Value) -> Result<Event, GatewayError> {
        let event = handlers::apply(&self.cache, event_type, data)?;

        self.waiters.resolve(&event);

        let listeners: Vec<Arc<dyn EventListener>> = self
            .listeners
            .get(&event_type)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        if !listeners.is_empty() {
            debug!(event = %event_type, listeners = listeners.len(), "Dispatching event");
        }
        for listener in listeners {
            let event = event.clone();
            tokio::spawn(async move {
                match AssertUnwindSafe(listener.call(event)).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(event = %event_type, error = %e, "Event listener failed");
                    }
                    Err(_) => {
                        error!(event = %event_type, "Event listener panicked");
                    }
                }
            });
        }

        Ok(event)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("event_types_with_listeners", &self.listeners.len())
            .finish()
    }
}
