//! `WebSocket` transport
//!
//! Thin wrapper over `tokio-tungstenite` that dials the gateway and hands
//! back the split halves for the writer task and the receive loop.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::GatewayError;

/// The underlying `WebSocket` stream type
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the socket
pub(crate) type WsSink = SplitSink<WsStream, Message>;

/// Read half of the socket
pub(crate) type WsReader = SplitStream<WsStream>;

/// A freshly dialed gateway socket
pub(crate) struct GatewaySocket {
    sink: WsSink,
    reader: WsReader,
}

impl GatewaySocket {
    /// Dial the gateway over `ws://` or `wss://`
    pub(crate) async fn connect(url: &str) -> Result<Self, GatewayError> {
        let (stream, _response) = connect_async(url).await?;
        let (sink, reader) = stream.split();
        Ok(Self { sink, reader })
    }

    /// Split into halves for the writer task and the receive loop
    pub(crate) fn into_parts(self) -> (WsSink, WsReader) {
        (self.sink, self.reader)
    }
}
