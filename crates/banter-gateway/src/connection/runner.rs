//! Connection runner
//!
//! Owns the reconnect loop for one logical gateway session: dial the
//! socket, complete the Hello handshake, authenticate, then pump frames
//! until the connection ends. Session state carries across attempts so a
//! drop turns into a Resume whenever the server allows it.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use banter_core::Intents;

use super::backoff::Backoff;
use super::heartbeat::{self, HeartbeatState};
use super::session::{Session, SharedSession};
use super::socket::{GatewaySocket, WsReader, WsSink};
use super::state::ConnectionState;
use crate::dispatch::Dispatcher;
use crate::error::GatewayError;
use crate::events::{Event, EventType};
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload, IdentifyPayload, OpCode};

/// Outbound frame queue capacity
const MESSAGE_BUFFER_SIZE: usize = 100;

/// Grace period for the writer task to flush after teardown
const WRITER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolves once the first session is established or fails for good
type ReadySender = oneshot::Sender<Result<(), GatewayError>>;

/// Runtime settings for one gateway connection
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Token presented in Identify and Resume
    pub token: String,

    /// Intent bits announced in Identify
    pub intents: Intents,

    /// URL to dial when no resume target exists
    pub gateway_url: String,

    /// How long to wait for Hello after the socket opens
    pub hello_timeout: Duration,

    /// Base reconnect delay
    pub reconnect_base: Duration,

    /// Reconnect delay ceiling
    pub reconnect_max: Duration,
}

/// What the reconnect loop does after an attempt ends
#[derive(Debug)]
enum LoopAction {
    /// Close was requested; stop for good
    Shutdown,
    /// Try to resume the current session
    Resume,
    /// Start over with a fresh Identify
    Reconnect,
    /// Unrecoverable; stop and surface the error
    Fatal(GatewayError),
}

/// A persistent gateway connection
///
/// One `Gateway` owns one logical session: the socket, its heartbeat and
/// writer tasks, and the resume bookkeeping that carries across
/// reconnects. Decoded Dispatch frames flow into the [`Dispatcher`].
pub struct Gateway {
    config: GatewayConfig,
    dispatcher: Arc<Dispatcher>,
    session: SharedSession,
    heartbeat: Arc<HeartbeatState>,
    state: RwLock<ConnectionState>,

    /// Sender feeding the current attempt's writer task
    outbound: Mutex<Option<mpsc::Sender<GatewayMessage>>>,

    /// Close flag watched by every task of this gateway
    close_tx: watch::Sender<bool>,

    /// Resolved on the first Ready or Resumed, or on a fatal error
    ready_tx: Mutex<Option<ReadySender>>,
}

impl Gateway {
    /// Create a gateway and the receiver that resolves once connected
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        dispatcher: Arc<Dispatcher>,
    ) -> (Arc<Self>, oneshot::Receiver<Result<(), GatewayError>>) {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (close_tx, _) = watch::channel(false);

        let gateway = Arc::new(Self {
            config,
            dispatcher,
            session: Session::new_shared(),
            heartbeat: Arc::new(HeartbeatState::new()),
            state: RwLock::new(ConnectionState::Disconnected),
            outbound: Mutex::new(None),
            close_tx,
            ready_tx: Mutex::new(Some(ready_tx)),
        });

        (gateway, ready_rx)
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Round-trip time of the last acknowledged heartbeat
    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.heartbeat.latency()
    }

    /// Whether a close has been requested
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.close_tx.borrow()
    }

    /// Request a close; the runner tears down and exits
    pub fn close(&self) {
        self.close_tx.send_replace(true);
    }

    /// Queue a frame for the writer task
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SendChannelClosed`] when no connection is
    /// live.
    pub async fn send(&self, message: GatewayMessage) -> Result<(), GatewayError> {
        let sender = self.outbound.lock().clone();
        match sender {
            Some(sender) => sender
                .send(message)
                .await
                .map_err(|_| GatewayError::SendChannelClosed),
            None => Err(GatewayError::SendChannelClosed),
        }
    }

    /// Drive the connection until closed or a fatal error
    ///
    /// Dials, handshakes, and pumps frames in a loop, sleeping with
    /// backoff between attempts. Resumes when session state allows it,
    /// otherwise re-identifies.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`GatewayError`] that ended an established
    /// session. A fatal error before the first Ready is delivered
    /// through the ready receiver instead.
    pub async fn run(self: Arc<Self>) -> Result<(), GatewayError> {
        let mut backoff = Backoff::new(self.config.reconnect_base, self.config.reconnect_max);
        let mut close_rx = self.close_tx.subscribe();

        loop {
            if self.is_closed() {
                return self.finish();
            }

            match self.run_attempt(&mut close_rx, &mut backoff).await {
                LoopAction::Shutdown => {
                    return self.finish();
                }
                LoopAction::Resume => {
                    self.set_state(ConnectionState::Reconnecting);
                    let delay = backoff.next_delay();
                    info!(delay = ?delay, attempt = backoff.attempt(), "Resuming after disconnect");
                    self.sleep_or_close(&mut close_rx, delay).await;
                }
                LoopAction::Reconnect => {
                    self.session.write().invalidate();
                    self.set_state(ConnectionState::Reconnecting);
                    let delay = backoff.next_delay();
                    info!(
                        delay = ?delay,
                        attempt = backoff.attempt(),
                        "Reconnecting with a fresh session"
                    );
                    self.sleep_or_close(&mut close_rx, delay).await;
                }
                LoopAction::Fatal(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    error!(error = %e, "Gateway stopped on fatal error");
                    // Before the first Ready the caller waiting on the
                    // ready channel owns the error
                    let pending = self.ready_tx.lock().take();
                    if let Some(tx) = pending {
                        let _ = tx.send(Err(e));
                        return Ok(());
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Clean exit shared by the shutdown paths
    fn finish(&self) -> Result<(), GatewayError> {
        self.set_state(ConnectionState::Disconnected);
        self.resolve_ready(Err(GatewayError::Closed(None)));
        info!("Gateway connection closed");
        Ok(())
    }

    /// One dial/handshake/receive cycle
    async fn run_attempt(
        &self,
        close_rx: &mut watch::Receiver<bool>,
        backoff: &mut Backoff,
    ) -> LoopAction {
        self.set_state(ConnectionState::Connecting);

        let url = self.connect_url();
        info!(url = %url, "Connecting to gateway");

        let socket = match GatewaySocket::connect(&url).await {
            Ok(socket) => socket,
            Err(e) => {
                warn!(error = %e, "Gateway dial failed");
                return self.resume_or_reconnect();
            }
        };
        let (sink, mut reader) = socket.into_parts();

        let hello = match self.wait_for_hello(&mut reader).await {
            Ok(hello) => hello,
            Err(e) => {
                warn!(error = %e, "Gateway handshake failed");
                return self.resume_or_reconnect();
            }
        };
        let interval = Duration::from_millis(hello.heartbeat_interval);

        let (outbound_tx, outbound_rx) = mpsc::channel(MESSAGE_BUFFER_SIZE);
        *self.outbound.lock() = Some(outbound_tx.clone());
        let mut writer = spawn_writer(sink, outbound_rx);

        self.heartbeat.reset();
        let (zombie_tx, zombie_rx) = oneshot::channel();
        let heartbeat_task = tokio::spawn(heartbeat::run_heartbeat(
            interval,
            Arc::clone(&self.session),
            Arc::clone(&self.heartbeat),
            outbound_tx.clone(),
            zombie_tx,
            self.close_tx.subscribe(),
        ));

        self.set_state(ConnectionState::Identifying);
        let action = match self.authenticate(&outbound_tx).await {
            Ok(()) => {
                self.receive_loop(&mut reader, &outbound_tx, zombie_rx, close_rx, backoff)
                    .await
            }
            Err(e) => {
                warn!(error = %e, "Failed to queue auth frame");
                self.resume_or_reconnect()
            }
        };

        *self.outbound.lock() = None;
        heartbeat_task.abort();
        drop(outbound_tx);

        // All senders are gone; the writer drains the queue, sends the
        // close frame, and exits on its own. Give it a grace period.
        tokio::select! {
            _ = &mut writer => {}
            () = tokio::time::sleep(WRITER_SHUTDOWN_TIMEOUT) => {
                writer.abort();
            }
        }

        action
    }

    /// Resume URL when a resumable session exists, configured URL
    /// otherwise
    fn connect_url(&self) -> String {
        let session = self.session.read();
        match session.resume_url() {
            Some(url) if session.can_resume() => url.to_string(),
            _ => self.config.gateway_url.clone(),
        }
    }

    /// Read frames until Hello arrives, bounded by the hello timeout
    async fn wait_for_hello(&self, reader: &mut WsReader) -> Result<HelloPayload, GatewayError> {
        let next_hello = async {
            loop {
                match reader.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let frame = GatewayMessage::from_json(&text)?;
                        if frame.op == OpCode::Hello {
                            return frame.as_hello().ok_or_else(|| {
                                GatewayError::handshake("Hello frame missing payload")
                            });
                        }
                        debug!(op = %frame.op, "Ignoring pre-Hello frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code));
                        return Err(GatewayError::Closed(code));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        return Err(GatewayError::handshake("connection ended before Hello"));
                    }
                }
            }
        };

        match tokio::time::timeout(self.config.hello_timeout, next_hello).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::HelloTimeout),
        }
    }

    /// Send Identify or Resume depending on session state
    async fn authenticate(
        &self,
        outbound: &mpsc::Sender<GatewayMessage>,
    ) -> Result<(), GatewayError> {
        let resume = self.session.read().resume_payload(&self.config.token);

        let frame = match resume {
            Some(payload) => {
                info!(session_id = %payload.session_id, seq = payload.seq, "Resuming session");
                GatewayMessage::resume(payload)
            }
            None => {
                info!("Identifying new session");
                GatewayMessage::identify(IdentifyPayload::new(
                    self.config.token.as_str(),
                    self.config.intents,
                ))
            }
        };

        outbound
            .send(frame)
            .await
            .map_err(|_| GatewayError::SendChannelClosed)
    }

    /// Pump frames until the connection ends or close is requested
    async fn receive_loop(
        &self,
        reader: &mut WsReader,
        outbound: &mpsc::Sender<GatewayMessage>,
        mut zombie_rx: oneshot::Receiver<()>,
        close_rx: &mut watch::Receiver<bool>,
        backoff: &mut Backoff,
    ) -> LoopAction {
        loop {
            tokio::select! {
                biased;

                // Discard the non-Send watch::Ref inside the branch future
                // so the select! output stays Send across the handler awaits
                _ = async { let _ = close_rx.wait_for(|closed| *closed).await; } => {
                    debug!("Close requested, leaving receive loop");
                    return LoopAction::Shutdown;
                }

                _ = &mut zombie_rx => {
                    warn!("Zombie connection flagged by heartbeat");
                    return self.resume_or_reconnect();
                }

                frame = reader.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        let message = match GatewayMessage::from_json(&text) {
                            Ok(message) => message,
                            Err(e) => {
                                warn!(error = %e, "Dropping malformed gateway frame");
                                continue;
                            }
                        };
                        if !message.is_valid_server_message() {
                            debug!(op = %message.op, "Dropping client-only opcode from server");
                            continue;
                        }
                        if let Some(action) = self.handle_frame(message, outbound, backoff).await {
                            return action;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code));
                        return self.classify_close(code);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Gateway read error");
                        return self.resume_or_reconnect();
                    }
                    None => {
                        warn!("Gateway stream ended without a close frame");
                        return self.resume_or_reconnect();
                    }
                }
            }
        }
    }

    /// Handle one server frame; `Some` breaks the receive loop
    async fn handle_frame(
        &self,
        message: GatewayMessage,
        outbound: &mpsc::Sender<GatewayMessage>,
        backoff: &mut Backoff,
    ) -> Option<LoopAction> {
        match message.op {
            OpCode::Dispatch => self.handle_dispatch(message, backoff),
            OpCode::Heartbeat => {
                // The server demanded an immediate beat
                let seq = self.session.read().seq();
                let _ = outbound.send(GatewayMessage::heartbeat(seq)).await;
                None
            }
            OpCode::HeartbeatAck => {
                self.heartbeat.record_ack();
                None
            }
            OpCode::Reconnect => {
                info!("Server requested reconnect");
                Some(self.resume_or_reconnect())
            }
            OpCode::InvalidSession => {
                if message.invalid_session_resumable() {
                    info!("Session invalidated, resume still possible");
                    Some(LoopAction::Resume)
                } else {
                    info!("Session invalidated, full reconnect required");
                    Some(LoopAction::Reconnect)
                }
            }
            OpCode::Hello => {
                debug!("Ignoring repeated Hello");
                None
            }
            _ => None,
        }
    }

    /// Handle a Dispatch frame: record the sequence, decode, dispatch
    fn handle_dispatch(
        &self,
        message: GatewayMessage,
        backoff: &mut Backoff,
    ) -> Option<LoopAction> {
        if let Some(seq) = message.s {
            self.session.write().record_seq(seq);
        }

        let Some(name) = message.t else {
            warn!("Dispatch frame missing event name");
            return None;
        };

        let Some(event_type) = EventType::from_str(&name) else {
            debug!(event = %name, "Ignoring unknown event type");
            return None;
        };

        let data = message.d.unwrap_or(Value::Null);
        match self.dispatcher.dispatch(event_type, data) {
            Ok(event) => self.observe_lifecycle(&event, backoff),
            Err(e) => {
                warn!(event = %event_type, error = %e, "Failed to decode event payload");
            }
        }

        None
    }

    /// Update connection state on session lifecycle events
    fn observe_lifecycle(&self, event: &Event, backoff: &mut Backoff) {
        match event {
            Event::Ready(ready) => {
                self.session
                    .write()
                    .establish(ready.session_id.clone(), ready.resume_gateway_url.clone());
                self.set_state(ConnectionState::Connected);
                backoff.reset();
                info!(
                    session_id = %ready.session_id,
                    user_id = %ready.user.id,
                    guilds = ready.guilds.len(),
                    "Gateway session established"
                );
                self.resolve_ready(Ok(()));
            }
            Event::Resumed => {
                self.set_state(ConnectionState::Connected);
                backoff.reset();
                info!("Gateway session resumed");
                self.resolve_ready(Ok(()));
            }
            _ => {}
        }
    }

    /// Map a close code to the next loop action
    fn classify_close(&self, code: Option<u16>) -> LoopAction {
        let Some(code) = code else {
            warn!("Connection closed without a close frame");
            return self.resume_or_reconnect();
        };

        if let Some(known) = CloseCode::from_u16(code) {
            if known.is_fatal() {
                error!(code = %known, "Fatal close code");
                return LoopAction::Fatal(GatewayError::AuthenticationFailed);
            }
            if known.invalidates_session() {
                warn!(code = %known, "Close code invalidates the session");
                return LoopAction::Reconnect;
            }
            warn!(code = %known, "Gateway closed the connection");
            return self.resume_or_reconnect();
        }

        if code == 1000 || code == 1001 {
            // A clean close ends the session server-side
            info!(code, "Gateway closed cleanly, starting over");
            return LoopAction::Reconnect;
        }

        warn!(code, "Gateway closed with unrecognized code");
        self.resume_or_reconnect()
    }

    /// Resume when session state allows it, reconnect otherwise
    fn resume_or_reconnect(&self) -> LoopAction {
        if self.session.read().can_resume() {
            LoopAction::Resume
        } else {
            LoopAction::Reconnect
        }
    }

    /// Sleep between attempts, waking early when close is requested
    async fn sleep_or_close(&self, close_rx: &mut watch::Receiver<bool>, delay: Duration) {
        tokio::select! {
            biased;
            _ = close_rx.wait_for(|closed| *closed) => {}
            () = tokio::time::sleep(delay) => {}
        }
    }

    /// Record a state change, logging actual transitions
    fn set_state(&self, next: ConnectionState) {
        let mut current = self.state.write();
        if *current != next {
            debug!(from = %*current, to = %next, "Connection state changed");
            *current = next;
        }
    }

    /// Resolve the ready channel exactly once
    fn resolve_ready(&self, result: Result<(), GatewayError>) {
        if let Some(tx) = self.ready_tx.lock().take() {
            let _ = tx.send(result);
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Writer task: drain the outbound queue into the socket
///
/// When every sender is dropped the queue ends; the task then sends the
/// close frame and exits.
fn spawn_writer(mut sink: WsSink, mut outbound: mpsc::Receiver<GatewayMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to encode outbound frame");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(json)).await {
                debug!(error = %e, "Writer task stopping, send failed");
                break;
            }
        }
        let _ = sink.close().await;
    })
}
