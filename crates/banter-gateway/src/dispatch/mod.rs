//! Event dispatch
//!
//! Routes decoded dispatch frames through built-in bookkeeping, resolves
//! pending waiters, then fans out to registered listeners as isolated
//! tasks.

mod dispatcher;
mod handlers;
mod waiters;

pub use dispatcher::{Dispatcher, EventListener};
pub use waiters::{WaiterRegistry, DEFAULT_WAIT_TIMEOUT};
