//! The duplex message channel a session runs over, and its WebSocket
//! implementation.

use std::net::TcpStream;

use chrono::Utc;
use thiserror::Error;
use tungstenite::protocol::CloseFrame;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// RFC 6455 "going away", sent when tearing a session down
pub const CLOSE_GOING_AWAY: u16 = 1001;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: tungstenite::Error,
    },
    #[error("websocket error: {0}")]
    Ws(#[from] tungstenite::Error),
    #[error("connection closed by server")]
    Closed,
}

/// Duplex message channel to the receiver.
///
/// A channel is exclusively owned by one session for its whole lifetime;
/// receive blocks until the server sends.
pub trait Channel {
    /// Send one text message, fire-and-forget
    fn send_text(&mut self, msg: &str) -> Result<(), TransportError>;
    /// Block until the next message arrives
    fn recv(&mut self) -> Result<Vec<u8>, TransportError>;
    /// Best-effort teardown; callers are permitted to ignore the result
    fn close(&mut self, code: u16) -> Result<(), TransportError>;
}

/// Blocking WebSocket channel to a Kiwi waterfall endpoint
pub struct WsChannel {
    ws: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl WsChannel {
    /// Open the waterfall endpoint on the Kiwi at `host:port`.
    ///
    /// The endpoint path is `/<unix-epoch-seconds>/W/F`.
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let addr = format!(
            "ws://{}:{}/{}/W/F",
            host,
            port,
            Utc::now().timestamp()
        );
        let (ws, _response) = tungstenite::connect(addr.as_str())
            .map_err(|source| TransportError::Connect { addr, source })?;
        Ok(Self { ws })
    }
}

impl Channel for WsChannel {
    fn send_text(&mut self, msg: &str) -> Result<(), TransportError> {
        Ok(self.ws.send(Message::Text(msg.to_owned()))?)
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        loop {
            match self.ws.read()? {
                Message::Binary(data) => return Ok(data),
                Message::Text(text) => return Ok(text.into_bytes()),
                Message::Close(_) => return Err(TransportError::Closed),
                // Pings are answered by the library on the next read
                _ => continue,
            }
        }
    }

    fn close(&mut self, code: u16) -> Result<(), TransportError> {
        use tungstenite::Error::{AlreadyClosed, ConnectionClosed};
        match self.ws.close(Some(CloseFrame {
            code: code.into(),
            reason: "".into(),
        })) {
            Ok(()) | Err(ConnectionClosed) | Err(AlreadyClosed) => {}
            Err(e) => return Err(e.into()),
        }
        // Drain until the server acks the close handshake
        loop {
            match self.ws.read() {
                Ok(_) => {}
                Err(ConnectionClosed) | Err(AlreadyClosed) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}
