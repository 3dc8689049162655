//! REST seam
//!
//! The handful of request/reply calls made outside the gateway: identity at
//! login, gateway URL discovery, and logout. Everything else on the wire is
//! gateway traffic, so no wider REST surface exists here.

mod http;

pub use http::HttpRestClient;

use async_trait::async_trait;
use banter_common::error::AppResult;
use banter_core::CurrentUser;

/// Request/reply calls the client performs against the REST API
///
/// The default implementation is [`HttpRestClient`]; tests inject stubs
/// through [`ClientBuilder::rest`](crate::client::ClientBuilder::rest).
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Fetch the identity of the account the token belongs to
    async fn login(&self) -> AppResult<CurrentUser>;

    /// Invalidate the session server-side
    async fn logout(&self) -> AppResult<()>;

    /// Discover the gateway WebSocket URL
    async fn gateway_url(&self) -> AppResult<String>;
}
