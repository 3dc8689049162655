//! Client builder

use std::sync::Arc;

use banter_common::config::ClientConfig;
use banter_core::Intents;

use super::client::Client;
use crate::rest::RestClient;

/// Step-by-step construction of a [`Client`]
///
/// Obtained from [`Client::builder`]. Every knob starts at its default;
/// `build` never fails, invalid settings surface when connecting.
#[must_use]
pub struct ClientBuilder {
    config: ClientConfig,
    intents: Intents,
    rest: Option<Arc<dyn RestClient>>,
}

impl ClientBuilder {
    pub(crate) fn new(token: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(token),
            intents: Intents::all(),
            rest: None,
        }
    }

    /// Set the intents announced at Identify
    pub fn intents(mut self, intents: Intents) -> Self {
        self.intents = intents;
        self
    }

    /// Replace the whole configuration, token included
    ///
    /// Useful with [`ClientConfig::from_env`].
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Inject a REST implementation, replacing the HTTP default
    pub fn rest(mut self, rest: Arc<dyn RestClient>) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Build the client
    pub fn build(self) -> Client {
        Client::from_parts(self.config, self.intents, self.rest)
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("intents", &self.intents)
            .field("custom_rest", &self.rest.is_some())
            .finish()
    }
}
