/// Socket.IO transport for the change-notification channel.
///
/// Speaks Engine.IO v4 over a plain websocket (see `socketio`). After the
/// socket opens the transport asks for the default namespace and reports
/// `Connected` only once the server acknowledges it. Server pings are
/// answered. After a drop it reconnects on its own, waiting
/// `reconnect_delay` between attempts, and reports each (re)connect so the
/// listener can rejoin its room.
use std::time::Duration;

use async_trait::async_trait;
use flowboard_core::sync::ClientNotice;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::listener::{NotificationTransport, TransportError, TransportEvent};
use crate::socketio::{self, Frame};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsTransport {
    url: String,
    reconnect_delay: Duration,
    socket: Option<Socket>,
    /// Namespace acknowledged; events may be emitted.
    ready: bool,
    /// Wait before the next connection attempt.
    backoff: bool,
    closed: bool,
}

impl WsTransport {
    /// `base` is the server origin (`ws://host:port`); the Socket.IO path
    /// is appended.
    pub fn new(base: &str, reconnect_delay: Duration) -> Self {
        Self {
            url: socketio::endpoint(base),
            reconnect_delay,
            socket: None,
            ready: false,
            backoff: false,
            closed: false,
        }
    }

    async fn connect(&mut self) {
        if self.backoff {
            tokio::time::sleep(self.reconnect_delay).await;
        }
        match tokio_tungstenite::connect_async(self.url.as_str()).await {
            Ok((socket, _)) => {
                log::info!(target: "flowboard.ws", "[ws] Socket open to {}", self.url);
                self.socket = Some(socket);
                self.backoff = false;
            }
            Err(e) => {
                log::warn!(target: "flowboard.ws", "[ws] Connect to {} failed: {}", self.url, e);
                self.backoff = true;
            }
        }
    }

    fn dropped(&mut self, reason: String) -> Option<TransportEvent> {
        let was_ready = self.ready;
        self.socket = None;
        self.ready = false;
        self.backoff = true;
        if was_ready {
            Some(TransportEvent::Disconnected(reason))
        } else {
            log::warn!(target: "flowboard.ws", "[ws] Handshake with {} failed: {}", self.url, reason);
            None
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;
        socket.send(Message::Text(text.to_string().into())).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationTransport for WsTransport {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            if self.closed {
                return None;
            }
            let Some(socket) = self.socket.as_mut() else {
                self.connect().await;
                continue;
            };

            let text = match socket.next().await {
                Some(Ok(Message::Text(text))) => text.to_string(),
                Some(Ok(Message::Ping(data))) => {
                    let _ = socket.send(Message::Pong(data)).await;
                    continue;
                }
                Some(Ok(Message::Close(_))) => match self.dropped("closed by server".to_string()) {
                    Some(event) => return Some(event),
                    None => continue,
                },
                Some(Ok(_)) => continue,
                Some(Err(e)) => match self.dropped(e.to_string()) {
                    Some(event) => return Some(event),
                    None => continue,
                },
                None => match self.dropped("stream ended".to_string()) {
                    Some(event) => return Some(event),
                    None => continue,
                },
            };

            let reply = match socketio::parse(&text) {
                Ok(Frame::Open) => socketio::CONNECT,
                Ok(Frame::Ping) => socketio::PONG,
                Ok(Frame::Connected) => {
                    log::info!(target: "flowboard.ws", "[ws] Connected to {}", self.url);
                    self.ready = true;
                    return Some(TransportEvent::Connected);
                }
                Ok(Frame::Event(notice)) => {
                    if self.ready {
                        return Some(TransportEvent::Notice(notice));
                    }
                    continue;
                }
                Ok(Frame::ConnectError(message)) => match self.dropped(format!("connect error: {}", message)) {
                    Some(event) => return Some(event),
                    None => continue,
                },
                Ok(Frame::Closed) => match self.dropped("disconnected by server".to_string()) {
                    Some(event) => return Some(event),
                    None => continue,
                },
                Ok(Frame::Ignored) => continue,
                Err(e) => {
                    log::warn!(target: "flowboard.ws", "[ws] Ignoring malformed frame: {}", e);
                    continue;
                }
            };
            if let Err(e) = self.write(reply).await {
                if let Some(event) = self.dropped(e.to_string()) {
                    return Some(event);
                }
            }
        }
    }

    async fn send(&mut self, notice: ClientNotice) -> Result<(), TransportError> {
        if !self.ready {
            return Err(TransportError::NotConnected);
        }
        let frame = socketio::encode(&notice)?;
        self.write(&frame).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        if self.ready {
            let _ = self.write(socketio::DISCONNECT).await;
        }
        self.ready = false;
        if let Some(mut socket) = self.socket.take() {
            socket.close(None).await?;
            log::info!(target: "flowboard.ws", "[ws] Closed connection to {}", self.url);
        }
        Ok(())
    }
}
