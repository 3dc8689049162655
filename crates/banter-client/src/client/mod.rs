//! Client facade
//!
//! [`Client`] ties the pieces together: REST login, the gateway runner,
//! listener registration, waiters, and read access to the cache.

mod builder;
mod client;

pub use builder::ClientBuilder;
pub use client::{Client, IntoEventType};
