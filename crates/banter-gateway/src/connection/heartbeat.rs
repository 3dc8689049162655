//! Heartbeat keepalive
//!
//! One task per connection attempt sends Heartbeat frames on the cadence
//! the server announced in Hello, and flags the connection as a zombie
//! when an ACK fails to arrive before the next beat comes due.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use super::session::SharedSession;
use crate::protocol::GatewayMessage;

/// ACK tracking shared between the heartbeat task and the receive loop
///
/// Lives as long as the [`Gateway`], not the connection attempt, so the
/// last measured latency stays readable across reconnects.
///
/// [`Gateway`]: super::Gateway
#[derive(Debug)]
pub(crate) struct HeartbeatState {
    /// A beat is in flight and its ACK has not arrived yet
    awaiting_ack: AtomicBool,

    /// When the in-flight beat was sent
    last_sent: Mutex<Option<Instant>>,

    /// Round-trip time of the last acknowledged beat
    latency: Mutex<Option<Duration>>,
}

impl HeartbeatState {
    pub(crate) fn new() -> Self {
        Self {
            awaiting_ack: AtomicBool::new(false),
            last_sent: Mutex::new(None),
            latency: Mutex::new(None),
        }
    }

    /// Forget any in-flight beat at the start of a connection attempt
    ///
    /// The measured latency survives so callers can still read the last
    /// known round-trip time while reconnecting.
    pub(crate) fn reset(&self) {
        self.awaiting_ack.store(false, Ordering::SeqCst);
        *self.last_sent.lock() = None;
    }

    /// Record that a beat went out
    pub(crate) fn mark_sent(&self) {
        self.awaiting_ack.store(true, Ordering::SeqCst);
        *self.last_sent.lock() = Some(Instant::now());
    }

    /// Record the server's ACK and update the measured latency
    pub(crate) fn record_ack(&self) {
        self.awaiting_ack.store(false, Ordering::SeqCst);
        if let Some(sent) = *self.last_sent.lock() {
            *self.latency.lock() = Some(sent.elapsed());
        }
    }

    /// Whether the last beat is still waiting for its ACK
    pub(crate) fn is_awaiting_ack(&self) -> bool {
        self.awaiting_ack.load(Ordering::SeqCst)
    }

    /// Round-trip time of the last acknowledged beat
    pub(crate) fn latency(&self) -> Option<Duration> {
        *self.latency.lock()
    }
}

/// Drive the heartbeat cadence for one connection attempt
///
/// The first beat fires after a random fraction of the interval so a
/// fleet of clients reconnecting together does not beat in lockstep.
/// When a beat comes due while the previous one is unacknowledged, the
/// task fires `zombie` once and exits; the receive loop tears the
/// connection down.
pub(crate) async fn run_heartbeat(
    interval: Duration,
    session: SharedSession,
    state: Arc<HeartbeatState>,
    outbound: mpsc::Sender<GatewayMessage>,
    zombie: oneshot::Sender<()>,
    mut close_rx: watch::Receiver<bool>,
) {
    let first_delay = interval.mul_f64(rand::random::<f64>());
    debug!(interval = ?interval, first_delay = ?first_delay, "Heartbeat task started");

    tokio::select! {
        biased;
        _ = close_rx.wait_for(|closed| *closed) => return,
        () = tokio::time::sleep(first_delay) => {}
    }

    if !beat(&session, &state, &outbound).await {
        let _ = zombie.send(());
        return;
    }

    loop {
        tokio::select! {
            biased;
            // Discard the non-Send watch::Ref inside the branch future so
            // the select! output stays Send across the handler awaits
            _ = async { let _ = close_rx.wait_for(|closed| *closed).await; } => {
                debug!("Heartbeat task shutting down");
                return;
            }
            () = tokio::time::sleep(interval) => {
                if !beat(&session, &state, &outbound).await {
                    warn!("Heartbeat ACK missed, flagging zombie connection");
                    let _ = zombie.send(());
                    return;
                }
            }
        }
    }
}

/// Send one beat; `false` means the connection is a zombie or the writer
/// is gone
async fn beat(
    session: &SharedSession,
    state: &HeartbeatState,
    outbound: &mpsc::Sender<GatewayMessage>,
) -> bool {
    if state.is_awaiting_ack() {
        return false;
    }

    let seq = session.read().seq();
    debug!(seq = ?seq, "Sending heartbeat");
    state.mark_sent();

    outbound.send(GatewayMessage::heartbeat(seq)).await.is_ok()
}
