//! HTTP implementation of the REST seam
//!
//! Sends bot-authorized requests against the configured API base. A 401 or
//! 403 from any call means the token is bad; that maps straight to the
//! fatal authentication error.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};

use banter_common::config::ApiConfig;
use banter_common::error::{AppError, AppResult};
use banter_core::CurrentUser;

use super::RestClient;

/// Response body of `GET /gateway`
#[derive(Debug, Deserialize)]
struct GatewayUrlResponse {
    url: String,
}

/// Default [`RestClient`] speaking HTTP with bot authorization
pub struct HttpRestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpRestClient {
    /// Create a client against the versioned API base
    #[must_use]
    pub fn new(api: &ApiConfig, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: api.versioned_url(),
            token: token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn get(&self, path: &str) -> AppResult<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(AppError::rest)?;
        check_status(response)
    }

    async fn post(&self, path: &str) -> AppResult<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .map_err(AppError::rest)?;
        check_status(response)
    }
}

/// Map auth rejections to the fatal error, other failures to REST errors
fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::AuthenticationFailed),
        status if status.is_success() => Ok(response),
        status => Err(AppError::rest(format!("unexpected status {status}"))),
    }
}

#[async_trait]
impl RestClient for HttpRestClient {
    #[instrument(skip(self))]
    async fn login(&self) -> AppResult<CurrentUser> {
        let user: CurrentUser = self
            .get("/users/@me")
            .await?
            .json()
            .await
            .map_err(AppError::rest)?;
        debug!(user_id = %user.id, bot = user.bot, "Fetched login identity");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> AppResult<()> {
        self.post("/auth/logout").await?;
        debug!("Session logged out");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn gateway_url(&self) -> AppResult<String> {
        let body: GatewayUrlResponse = self
            .get("/gateway")
            .await?
            .json()
            .await
            .map_err(AppError::rest)?;
        debug!(url = %body.url, "Discovered gateway URL");
        Ok(body.url)
    }
}

impl std::fmt::Debug for HttpRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token stays out of logs
        f.debug_struct("HttpRestClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
