//! Test helpers for integration tests
//!
//! Provides a scripted gateway server, a canned REST layer, and a client
//! factory with test-speed timings.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use banter_client::{AppResult, Client, ClientConfig, RestClient};
use banter_core::{CurrentUser, Snowflake};
use banter_gateway::protocol::{GatewayMessage, IdentifyPayload, OpCode, ResumePayload};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use crate::fixtures::{hello_frame, ready_frame};

/// Counter for unique test ports
static PORT_COUNTER: AtomicU16 = AtomicU16::new(19000);

/// Time limit for any single scripted exchange
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Get a unique port for testing
pub fn get_test_port() -> u16 {
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// What the scripted gateway observes about client traffic
#[derive(Debug, Default)]
pub struct GatewayLog {
    frames: Mutex<Vec<GatewayMessage>>,
    connections: AtomicUsize,
}

impl GatewayLog {
    /// Frames received from the client so far
    pub fn frames(&self) -> Vec<GatewayMessage> {
        self.frames.lock().clone()
    }

    /// Received frames carrying one op code
    pub fn frames_with_op(&self, op: OpCode) -> Vec<GatewayMessage> {
        self.frames
            .lock()
            .iter()
            .filter(|frame| frame.op == op)
            .cloned()
            .collect()
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    fn record(&self, frame: GatewayMessage) {
        self.frames.lock().push(frame);
    }
}

/// One accepted client connection, driven by a test script
pub struct ScriptedConnection {
    ws: WebSocketStream<TcpStream>,
    log: Arc<GatewayLog>,
    /// Zero-based index of this connection
    pub attempt: usize,
}

impl ScriptedConnection {
    /// Send one frame to the client
    pub async fn send(&mut self, frame: GatewayMessage) -> Result<()> {
        let json = frame.to_json()?;
        self.ws.send(WsMessage::Text(json)).await?;
        Ok(())
    }

    /// Read text frames until one parses, recording it in the log
    pub async fn recv(&mut self) -> Result<GatewayMessage> {
        loop {
            let message = tokio::time::timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for a client frame")?
                .ok_or_else(|| anyhow!("client closed the connection"))??;

            if let WsMessage::Text(text) = message {
                let frame = GatewayMessage::from_json(&text)?;
                self.log.record(frame.clone());
                return Ok(frame);
            }
        }
    }

    /// Read the next frame and require an Identify
    pub async fn expect_identify(&mut self) -> Result<IdentifyPayload> {
        let frame = self.recv().await?;
        frame
            .as_identify()
            .ok_or_else(|| anyhow!("expected an Identify frame, got {frame}"))
    }

    /// Read the next frame and require a Resume
    pub async fn expect_resume(&mut self) -> Result<ResumePayload> {
        let frame = self.recv().await?;
        frame
            .as_resume()
            .ok_or_else(|| anyhow!("expected a Resume frame, got {frame}"))
    }

    /// Read frames until a Heartbeat arrives, returning its sequence
    pub async fn expect_heartbeat(&mut self) -> Result<Option<u64>> {
        loop {
            let frame = self.recv().await?;
            if let Some(seq) = frame.as_heartbeat_seq() {
                return Ok(seq);
            }
        }
    }

    /// Acknowledge heartbeats, and swallow everything else, until the
    /// client disconnects
    pub async fn ack_until_disconnect(&mut self) {
        while let Ok(frame) = self.recv().await {
            if frame.as_heartbeat_seq().is_some()
                && self.send(GatewayMessage::heartbeat_ack()).await.is_err()
            {
                return;
            }
        }
    }

    /// Hello, then answer the client's Identify with a READY dispatch
    pub async fn handshake(
        &mut self,
        heartbeat_interval_ms: u64,
        session_id: &str,
        user_id: i64,
    ) -> Result<()> {
        self.send(hello_frame(heartbeat_interval_ms)).await?;
        self.expect_identify().await?;
        self.send(ready_frame(session_id, 1, user_id, &[])).await?;
        Ok(())
    }

    /// Close the connection with a specific close code
    pub async fn close_with(mut self, code: u16) -> Result<()> {
        self.ws
            .send(WsMessage::Close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: "scripted close".into(),
            })))
            .await?;

        // Drain until the peer acknowledges so the code reaches it intact
        while let Ok(Some(_)) = tokio::time::timeout(STEP_TIMEOUT, self.ws.next()).await {}
        Ok(())
    }
}

/// Scripted gateway server listening on a local port
///
/// Each accepted connection runs `script` with its zero-based attempt
/// index. Script failures surface on stderr and through whatever the
/// client observed; the log carries every frame the client sent.
pub struct ScriptedGateway {
    addr: SocketAddr,
    pub log: Arc<GatewayLog>,
    _handle: JoinHandle<()>,
}

impl ScriptedGateway {
    /// Start a gateway whose connections are driven by `script`
    pub async fn start<F, Fut>(script: F) -> Result<Self>
    where
        F: Fn(ScriptedConnection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let port = get_test_port();
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr).await?;
        let actual_addr = listener.local_addr()?;

        let log = Arc::new(GatewayLog::default());
        let accept_log = Arc::clone(&log);
        let script = Arc::new(script);

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let attempt = accept_log.connections.fetch_add(1, Ordering::SeqCst);
                let log = Arc::clone(&accept_log);
                let script = Arc::clone(&script);

                tokio::spawn(async move {
                    let ws = match tokio_tungstenite::accept_async(stream).await {
                        Ok(ws) => ws,
                        Err(e) => {
                            eprintln!("test gateway handshake failed: {e}");
                            return;
                        }
                    };
                    let conn = ScriptedConnection { ws, log, attempt };
                    if let Err(e) = script(conn).await {
                        eprintln!("test gateway script failed on attempt {attempt}: {e}");
                    }
                });
            }
        });

        Ok(Self {
            addr: actual_addr,
            log,
            _handle: handle,
        })
    }

    /// WebSocket URL of this gateway
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }
}

/// Canned REST layer pointing the client at a scripted gateway
pub struct CannedRest {
    user_id: i64,
    gateway_url: String,
}

impl CannedRest {
    pub fn new(user_id: i64, gateway_url: impl Into<String>) -> Self {
        Self {
            user_id,
            gateway_url: gateway_url.into(),
        }
    }
}

#[async_trait]
impl RestClient for CannedRest {
    async fn login(&self) -> AppResult<CurrentUser> {
        Ok(CurrentUser {
            id: Snowflake::new(self.user_id),
            username: format!("bot-{}", self.user_id),
            discriminator: String::new(),
            avatar: None,
            bot: true,
        })
    }

    async fn logout(&self) -> AppResult<()> {
        Ok(())
    }

    async fn gateway_url(&self) -> AppResult<String> {
        Ok(self.gateway_url.clone())
    }
}

/// Build a client wired to a scripted gateway, with test-speed timings
///
/// The gateway URL is left to REST discovery, exercising the same path a
/// production client takes.
pub fn test_client(token: &str, gateway: &ScriptedGateway, user_id: i64) -> Client {
    let mut config = ClientConfig::new(token);
    config.gateway.hello_timeout_ms = 2_000;
    config.gateway.reconnect_base_ms = 10;
    config.gateway.reconnect_max_ms = 50;

    Client::builder(token)
        .config(config)
        .rest(Arc::new(CannedRest::new(user_id, gateway.url())))
        .build()
}

/// Poll `check` until it passes or the deadline expires
pub async fn wait_until<F>(deadline: Duration, check: F) -> bool
where
    F: Fn() -> bool,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
