//! Integration test utilities for the client
//!
//! This crate provides a scripted gateway server speaking the real wire
//! protocol over a local WebSocket, a canned REST layer, and frame
//! fixtures, so end-to-end client tests never leave the process.

pub mod helpers;
pub mod fixtures;

pub use helpers::*;
pub use fixtures::*;
