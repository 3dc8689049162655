//! Waiter registry
//!
//! One-shot waiters let a caller suspend until an event matching a
//! predicate arrives, bounded by a timeout. Registrations are keyed by a
//! uuid so expiry removes exactly the right waiter and nothing lingers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use banter_common::error::{AppError, AppResult};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::events::{Event, EventType};

/// Timeout applied when the caller does not supply one
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

type Predicate = Box<dyn Fn(&Event) -> bool + Send + Sync>;

struct Waiter {
    id: Uuid,
    predicate: Predicate,
    sender: oneshot::Sender<Event>,
}

/// Registry of pending one-shot event waiters
#[derive(Default)]
pub struct WaiterRegistry {
    waiters: Mutex<HashMap<EventType, Vec<Waiter>>>,
}

impl WaiterRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Create an empty registry behind an `Arc`
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Suspend until an event of `event_type` satisfies `predicate`
    ///
    /// Resolves with the first matching event arriving after registration,
    /// or `AppError::WaitTimeout` once the timeout elapses. A `None`
    /// timeout uses [`DEFAULT_WAIT_TIMEOUT`]. Concurrent waiters on the
    /// same event type are independent; one event may resolve several.
    pub async fn wait_for<P>(
        &self,
        event_type: EventType,
        predicate: P,
        timeout: Option<Duration>,
    ) -> AppResult<Event>
    where
        P: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let (id, receiver) = self.register(event_type, Box::new(predicate));
        let mut guard = DeregisterGuard {
            registry: self,
            event_type,
            id,
            armed: true,
        };

        match tokio::time::timeout(timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT), receiver).await {
            Ok(Ok(event)) => {
                guard.armed = false;
                Ok(event)
            }
            // The registry dropped the sender, e.g. cleared on shutdown
            Ok(Err(_)) => {
                guard.armed = false;
                Err(AppError::gateway("waiter dropped before resolution"))
            }
            Err(_) => Err(AppError::WaitTimeout),
        }
    }

    /// Number of pending waiters across all event types
    #[must_use]
    pub fn pending(&self) -> usize {
        self.waiters.lock().values().map(Vec::len).sum()
    }

    /// Drop every pending waiter
    ///
    /// Their `wait_for` calls resolve with an error rather than hanging
    /// until timeout.
    pub fn clear(&self) {
        self.waiters.lock().clear();
    }

    /// Resolve waiters whose predicate accepts this event
    ///
    /// Waiters whose receiving end is already gone are pruned on the way.
    pub(crate) fn resolve(&self, event: &Event) {
        let event_type = event.event_type();
        let mut map = self.waiters.lock();
        let Some(list) = map.get_mut(&event_type) else {
            return;
        };

        for waiter in std::mem::take(list) {
            if waiter.sender.is_closed() {
                continue;
            }
            if (waiter.predicate)(event) {
                let _ = waiter.sender.send(event.clone());
            } else {
                list.push(waiter);
            }
        }
        if list.is_empty() {
            map.remove(&event_type);
        }
    }

    fn register(&self, event_type: EventType, predicate: Predicate) -> (Uuid, oneshot::Receiver<Event>) {
        let (sender, receiver) = oneshot::channel();
        let id = Uuid::new_v4();
        self.waiters
            .lock()
            .entry(event_type)
            .or_default()
            .push(Waiter { id, predicate, sender });
        tracing::trace!(event = %event_type, waiter_id = %id, "Waiter registered");
        (id, receiver)
    }

    fn deregister(&self, event_type: EventType, id: Uuid) {
        let mut map = self.waiters.lock();
        if let Some(list) = map.get_mut(&event_type) {
            list.retain(|w| w.id != id);
            if list.is_empty() {
                map.remove(&event_type);
            }
        }
    }
}

/// Removes the registration on drop unless the waiter already resolved
struct DeregisterGuard<'a> {
    registry: &'a WaiterRegistry,
    event_type: EventType,
    id: Uuid,
    armed: bool,
}

impl Drop for DeregisterGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.deregister(self.event_type, self.id);
        }
    }
}

impl std::fmt::Debug for WaiterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaiterRegistry")
            .field("pending", &self.pending())
            .finish()
    }
}
