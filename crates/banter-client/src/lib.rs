//! # banter-client
//!
//! The user-facing crate: a [`Client`] that logs in over REST, holds a
//! self-healing gateway connection, keeps an entity cache warm, and fans
//! events out to registered listeners.
//!
//! ```no_run
//! use banter_client::{Client, EventType};
//!
//! #[tokio::main]
//! async fn main() -> banter_client::AppResult<()> {
//!     let client = Client::new("my-token");
//!     client.on_event(EventType::MessageCreate, |event| async move {
//!         if let banter_client::Event::MessageCreate(message) = event {
//!             println!("{}", message.content);
//!         }
//!         Ok(())
//!     })?;
//!     client.run().await
//! }
//! ```

pub mod client;
pub mod rest;

// Re-export commonly used types at crate root
pub use client::{Client, ClientBuilder, IntoEventType};
pub use rest::{HttpRestClient, RestClient};

pub use banter_common::{AppError, AppResult, ClientConfig};
pub use banter_core::{Channel, ChannelType, CurrentUser, Guild, Intents, Message, Snowflake, User};
pub use banter_gateway::connection::ConnectionState;
pub use banter_gateway::dispatch::{EventListener, DEFAULT_WAIT_TIMEOUT};
pub use banter_gateway::events::{Event, EventType};
