//! Gateway connection lifecycle
//!
//! The [`Gateway`] runner owns the socket and its helper tasks;
//! [`Session`] carries resume state across attempts and
//! [`ConnectionState`] names where the runner currently is.

mod backoff;
mod heartbeat;
mod runner;
mod session;
mod socket;
mod state;

pub use runner::{Gateway, GatewayConfig};
pub use session::{Session, SharedSession};
pub use state::ConnectionState;
