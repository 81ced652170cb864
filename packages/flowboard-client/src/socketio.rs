/// Socket.IO v5 over Engine.IO v4 framing, websocket transport only.
///
/// Every text frame starts with an Engine.IO packet type; `4` (message)
/// carries a Socket.IO packet whose own type follows. Events travel as
/// `42["name", ...args]`. The default namespace is the only one used.
use flowboard_core::sync::{ClientNotice, ServerNotice, BOARD_UPDATED};
use serde_json::Value;

/// Socket.IO connect request for the default namespace.
pub const CONNECT: &str = "40";
/// Socket.IO disconnect for the default namespace.
pub const DISCONNECT: &str = "41";
/// Engine.IO pong, the answer to a server ping.
pub const PONG: &str = "3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Engine.IO handshake; the client must ask for the namespace next.
    Open,
    /// Namespace joined; events may flow.
    Connected,
    Ping,
    /// Engine.IO close or Socket.IO disconnect.
    Closed,
    ConnectError(String),
    Event(ServerNotice),
    /// Anything this client has no use for (pongs, noops, acks).
    Ignored,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Empty frame")]
    Empty,

    #[error("Malformed event payload: {0}")]
    Payload(String),
}

/// Websocket endpoint of a Socket.IO server reachable at `base`.
pub fn endpoint(base: &str) -> String {
    format!("{}/socket.io/?EIO=4&transport=websocket", base.trim_end_matches('/'))
}

pub fn encode(notice: &ClientNotice) -> Result<String, serde_json::Error> {
    let args = serde_json::to_string(&(notice.event(), notice.board_id()))?;
    Ok(format!("42{}", args))
}

pub fn parse(text: &str) -> Result<Frame, FrameError> {
    let mut chars = text.chars();
    let engine = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();
    match engine {
        '0' => Ok(Frame::Open),
        '1' => Ok(Frame::Closed),
        '2' => Ok(Frame::Ping),
        '4' => parse_packet(rest),
        _ => Ok(Frame::Ignored),
    }
}

fn parse_packet(text: &str) -> Result<Frame, FrameError> {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Ok(Frame::Ignored);
    };
    let body = chars.as_str();
    match kind {
        '0' => Ok(Frame::Connected),
        '1' => Ok(Frame::Closed),
        '2' => parse_event(body).map(Frame::Event),
        '4' => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| body.to_string());
            Ok(Frame::ConnectError(message))
        }
        _ => Ok(Frame::Ignored),
    }
}

fn parse_event(body: &str) -> Result<ServerNotice, FrameError> {
    // An ack id may sit between the packet type and the payload.
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let args: Vec<Value> = serde_json::from_str(body).map_err(|e| FrameError::Payload(e.to_string()))?;
    let name = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| FrameError::Payload("event name missing".to_string()))?;

    if name != BOARD_UPDATED {
        return Ok(ServerNotice::Other(name.to_string()));
    }
    let data = args.get(1);
    let field = |key: &str| {
        data.and_then(|d| d.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    Ok(ServerNotice::BoardUpdated {
        board_id: field("boardId").or_else(|| field("board_id")),
        message: field("message"),
    })
}
