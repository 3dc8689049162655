//! The client facade
//!
//! One [`Client`] owns the cache, dispatcher, and waiter registry for its
//! lifetime, and a gateway runner task while connected. Listeners may be
//! registered before or after connecting; cached state survives reconnects
//! and is readable at any time.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use banter_cache::{CacheConfig, CacheStore};
use banter_common::config::ClientConfig;
use banter_common::error::{AppError, AppResult};
use banter_core::{Channel, CurrentUser, Guild, Intents, Message, Snowflake, User};
use banter_gateway::connection::{ConnectionState, Gateway, GatewayConfig};
use banter_gateway::dispatch::{Dispatcher, EventListener, WaiterRegistry};
use banter_gateway::error::GatewayError;
use banter_gateway::events::{Event, EventType};
use banter_gateway::protocol::{GatewayMessage, PresenceUpdatePayload};

use super::builder::ClientBuilder;
use crate::rest::{HttpRestClient, RestClient};

/// Event selector accepted by registration and waiters
///
/// Implemented for [`EventType`] and for wire names as `&str`; an
/// unrecognized name fails synchronously with
/// [`AppError::UnknownEvent`].
pub trait IntoEventType {
    /// Resolve to a concrete event type
    fn into_event_type(self) -> AppResult<EventType>;
}

impl IntoEventType for EventType {
    fn into_event_type(self) -> AppResult<EventType> {
        Ok(self)
    }
}

impl IntoEventType for &str {
    fn into_event_type(self) -> AppResult<EventType> {
        EventType::from_str(self).ok_or_else(|| AppError::unknown_event(self))
    }
}

/// Live connection: the gateway handle and its runner task
struct Runtime {
    gateway: Arc<Gateway>,
    runner: Option<JoinHandle<Result<(), GatewayError>>>,
}

/// The user-facing client
///
/// Construct with [`Client::new`] or [`Client::builder`], register
/// listeners, then [`connect`](Client::connect) or [`run`](Client::run).
/// All methods take `&self`; the client is meant to be shared behind an
/// `Arc` when handlers need it.
pub struct Client {
    config: ClientConfig,
    intents: Intents,
    cache: Arc<CacheStore>,
    waiters: Arc<WaiterRegistry>,
    dispatcher: Arc<Dispatcher>,
    rest: Arc<dyn RestClient>,
    runtime: Mutex<Option<Runtime>>,
}

impl Client {
    /// Create a client with default settings
    ///
    /// The token is trimmed; intents default to [`Intents::all`].
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::builder(token).build()
    }

    /// Start building a client with custom settings
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    pub(crate) fn from_parts(
        config: ClientConfig,
        intents: Intents,
        rest: Option<Arc<dyn RestClient>>,
    ) -> Self {
        let cache = CacheStore::new_shared(CacheConfig {
            messages_per_channel: config.cache.messages_per_channel,
        });
        let waiters = WaiterRegistry::new_shared();
        let dispatcher = Dispatcher::new_shared(Arc::clone(&cache), Arc::clone(&waiters));
        let rest: Arc<dyn RestClient> = match rest {
            Some(rest) => rest,
            None => Arc::new(HttpRestClient::new(&config.api, config.token.clone())),
        };

        Self {
            config,
            intents,
            cache,
            waiters,
            dispatcher,
            rest,
            runtime: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Log in over REST and bring the gateway connection up
    ///
    /// Resolves once the first session is established. The connection then
    /// maintains itself: drops are resumed or re-identified with backoff
    /// until [`close`](Client::close) or a fatal error.
    ///
    /// # Errors
    ///
    /// [`AppError::AlreadyConnected`] when a connection is already up,
    /// [`AppError::AuthenticationFailed`] when the token is rejected, and
    /// configuration or REST errors from the login call.
    pub async fn connect(&self) -> AppResult<()> {
        if self.runtime.lock().is_some() {
            return Err(AppError::AlreadyConnected);
        }
        self.config.validate()?;

        let user = self.rest.login().await?;
        info!(user_id = %user.id, username = %user.username, "Logged in");
        self.cache.set_current_user(user);

        let gateway_url = match &self.config.gateway.url {
            Some(url) => url.clone(),
            None => self.rest.gateway_url().await?,
        };
        debug!(url = %gateway_url, "Resolved gateway URL");

        let gateway_config = GatewayConfig {
            token: self.config.token.clone(),
            intents: self.intents,
            gateway_url,
            hello_timeout: Duration::from_millis(self.config.gateway.hello_timeout_ms),
            reconnect_base: Duration::from_millis(self.config.gateway.reconnect_base_ms),
            reconnect_max: Duration::from_millis(self.config.gateway.reconnect_max_ms),
        };

        let (gateway, ready_rx) = Gateway::new(gateway_config, Arc::clone(&self.dispatcher));
        let runner = tokio::spawn(Arc::clone(&gateway).run());
        *self.runtime.lock() = Some(Runtime {
            gateway,
            runner: Some(runner),
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                info!("Client connected");
                Ok(())
            }
            Ok(Err(e)) => {
                self.discard_runtime().await;
                Err(e.into())
            }
            Err(_) => {
                self.discard_runtime().await;
                Err(AppError::gateway("connection ended before becoming ready"))
            }
        }
    }

    /// Connect, then stay up until an interrupt or a fatal error
    ///
    /// Parks after [`connect`](Client::connect) and shuts down cleanly on
    /// Ctrl-C, on [`close`](Client::close) from another task, or when the
    /// gateway stops on a fatal error (which is returned).
    pub async fn run(&self) -> AppResult<()> {
        self.connect().await?;

        let runner = self
            .runtime
            .lock()
            .as_mut()
            .and_then(|runtime| runtime.runner.take());
        let Some(mut runner) = runner else {
            return self.close().await;
        };

        let outcome = tokio::select! {
            outcome = &mut runner => Some(outcome),
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Interrupt received, shutting down"),
                    Err(e) => warn!(error = %e, "Interrupt handler failed, shutting down"),
                }
                None
            }
        };

        match outcome {
            // The runner only exits cleanly after a requested close
            Some(Ok(Ok(()))) => self.close().await,
            Some(Ok(Err(e))) => {
                let _ = self.close().await;
                Err(e.into())
            }
            Some(Err(e)) => {
                let _ = self.close().await;
                Err(AppError::internal(e))
            }
            None => {
                let result = self.close().await;
                let _ = runner.await;
                result
            }
        }
    }

    /// Log out and tear the connection down
    ///
    /// Idempotent: closing a client that is not connected does nothing. A
    /// failed REST logout is logged, not returned; the gateway side is
    /// still torn down.
    pub async fn close(&self) -> AppResult<()> {
        let runtime = self.runtime.lock().take();
        let Some(runtime) = runtime else {
            debug!("Close requested while not connected");
            return Ok(());
        };

        if let Err(e) = self.rest.logout().await {
            warn!(error = %e, "REST logout failed during close");
        }

        runtime.gateway.close();
        if let Some(runner) = runtime.runner {
            match runner.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Gateway runner exited with error"),
                Err(e) => warn!(error = %e, "Gateway runner task failed"),
            }
        }
        info!("Client closed");
        Ok(())
    }

    /// Drop a runtime whose connection never became ready
    async fn discard_runtime(&self) {
        let runtime = self.runtime.lock().take();
        if let Some(runtime) = runtime {
            runtime.gateway.close();
            if let Some(runner) = runtime.runner {
                let _ = runner.await;
            }
        }
    }

    fn gateway(&self) -> AppResult<Arc<Gateway>> {
        self.runtime
            .lock()
            .as_ref()
            .map(|runtime| Arc::clone(&runtime.gateway))
            .ok_or(AppError::NotConnected)
    }

    // ------------------------------------------------------------------
    // Listeners and waiters
    // ------------------------------------------------------------------

    /// Register an async closure for an event
    ///
    /// The event may be given as [`EventType`] or its wire name. Listeners
    /// accumulate; registering twice for the same event keeps both. Each
    /// invocation runs in its own task, so a failing or panicking listener
    /// never affects the connection or other listeners.
    ///
    /// # Errors
    ///
    /// [`AppError::UnknownEvent`] for an unrecognized wire name.
    pub fn on_event<E, F, Fut>(&self, event: E, handler: F) -> AppResult<()>
    where
        E: IntoEventType,
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        let event_type = event.into_event_type()?;
        self.dispatcher.on(event_type, handler);
        Ok(())
    }

    /// Register a listener implementation for an event
    ///
    /// The trait-object counterpart of [`on_event`](Client::on_event), for
    /// listeners with state of their own.
    pub fn add_listener<E>(&self, event: E, listener: Arc<dyn EventListener>) -> AppResult<()>
    where
        E: IntoEventType,
    {
        let event_type = event.into_event_type()?;
        self.dispatcher.register(event_type, listener);
        Ok(())
    }

    /// Suspend until an event matching `predicate` arrives
    ///
    /// A `None` timeout applies the registry default. On timeout the
    /// registration is removed and [`AppError::WaitTimeout`] returned;
    /// other waiters are unaffected.
    pub async fn wait_for<E, P>(
        &self,
        event: E,
        predicate: P,
        timeout: Option<Duration>,
    ) -> AppResult<Event>
    where
        E: IntoEventType,
        P: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        let event_type = event.into_event_type()?;
        self.waiters.wait_for(event_type, predicate, timeout).await
    }

    // ------------------------------------------------------------------
    // Outbound actions
    // ------------------------------------------------------------------

    /// Announce a presence status (online, idle, dnd, offline)
    ///
    /// # Errors
    ///
    /// [`AppError::NotConnected`] unless a session is established.
    pub async fn update_presence(&self, status: impl Into<String>) -> AppResult<()> {
        let gateway = self.gateway()?;
        if !gateway.state().is_connected() {
            return Err(AppError::NotConnected);
        }

        let payload = PresenceUpdatePayload::new(status);
        if !payload.is_valid_status() {
            warn!(status = %payload.status, "Unrecognized presence status");
        }
        gateway
            .send(GatewayMessage::presence_update(payload))
            .await
            .map_err(AppError::from)
    }

    // ------------------------------------------------------------------
    // Cached state
    // ------------------------------------------------------------------

    /// The logged-in account, after a successful connect
    #[must_use]
    pub fn user(&self) -> Option<CurrentUser> {
        self.cache.current_user()
    }

    /// Snapshot of all cached users
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.cache.users()
    }

    /// Snapshot of all cached guilds
    #[must_use]
    pub fn guilds(&self) -> Vec<Guild> {
        self.cache.guilds()
    }

    /// Snapshot of all cached channels
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        self.cache.channels()
    }

    /// Snapshot of cached DM channels
    #[must_use]
    pub fn dm_channels(&self) -> Vec<Channel> {
        self.cache.dm_channels()
    }

    /// Snapshot of all cached messages
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.cache.messages()
    }

    /// Cached history of one channel, oldest first
    #[must_use]
    pub fn channel_history(&self, channel_id: Snowflake) -> Vec<Message> {
        self.cache.channel_history(channel_id)
    }

    /// Look up a cached user
    #[must_use]
    pub fn get_user(&self, id: Snowflake) -> Option<User> {
        self.cache.get_user(id)
    }

    /// Look up a cached guild
    #[must_use]
    pub fn get_guild(&self, id: Snowflake) -> Option<Guild> {
        self.cache.get_guild(id)
    }

    /// Look up a cached channel
    #[must_use]
    pub fn get_channel(&self, id: Snowflake) -> Option<Channel> {
        self.cache.get_channel(id)
    }

    /// Look up a cached message
    #[must_use]
    pub fn get_message(&self, id: Snowflake) -> Option<Message> {
        self.cache.get_message(id)
    }

    // ------------------------------------------------------------------
    // Connection introspection
    // ------------------------------------------------------------------

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.runtime
            .lock()
            .as_ref()
            .map_or(ConnectionState::Disconnected, |runtime| {
                runtime.gateway.state()
            })
    }

    /// Whether a session is currently established
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Round-trip time of the most recent heartbeat
    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.runtime
            .lock()
            .as_ref()
            .and_then(|runtime| runtime.gateway.latency())
    }

    /// The intents announced at Identify
    #[must_use]
    pub fn intents(&self) -> Intents {
        self.intents
    }

    /// The configuration this client was built with
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// OAuth authorize URL for inviting the logged-in account
    ///
    /// # Errors
    ///
    /// [`AppError::NotConnected`] before a login has populated the
    /// current user.
    pub fn invite_url(&self) -> AppResult<String> {
        let user = self.cache.current_user().ok_or(AppError::NotConnected)?;
        Ok(format!(
            "{}/oauth2/authorize?client_id={}&scope=bot",
            self.config.api.base_url.trim_end_matches('/'),
            user.id
        ))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state())
            .field("intents", &self.intents)
            .field("users", &self.cache.user_count())
            .field("guilds", &self.cache.guild_count())
            .finish()
    }
}
