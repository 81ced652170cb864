/// Change-notification protocol shared by the listener and its transports.
///
/// Protocol:
///   Client emits `join_board` with the board id once connected.
///   Server emits `board_updated` to the room whenever any client mutates
///   the board. Only the arrival of the signal matters; its payload is
///   informational.
///   Client emits `leave_board` with the board id before switching boards or
///   disconnecting.
///
/// How the events are framed on the wire is up to the transport.
use serde::Serialize;

pub const JOIN_BOARD: &str = "join_board";
pub const LEAVE_BOARD: &str = "leave_board";
pub const BOARD_UPDATED: &str = "board_updated";

/// Events emitted by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientNotice {
    JoinBoard { board_id: String },
    LeaveBoard { board_id: String },
}

impl ClientNotice {
    pub fn event(&self) -> &'static str {
        match self {
            ClientNotice::JoinBoard { .. } => JOIN_BOARD,
            ClientNotice::LeaveBoard { .. } => LEAVE_BOARD,
        }
    }

    /// The event's single argument.
    pub fn board_id(&self) -> &str {
        match self {
            ClientNotice::JoinBoard { board_id } | ClientNotice::LeaveBoard { board_id } => board_id,
        }
    }
}

/// Events received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerNotice {
    BoardUpdated {
        /// Room the signal was sent to. Servers that only broadcast inside
        /// the room omit it.
        board_id: Option<String>,
        message: Option<String>,
    },
    /// Any other event, by name.
    Other(String),
}

impl ServerNotice {
    /// Whether this notice asks a client joined to `board_id` to refetch.
    pub fn invalidates(&self, board_id: &str) -> bool {
        match self {
            ServerNotice::BoardUpdated { board_id: Some(id), .. } => id == board_id,
            ServerNotice::BoardUpdated { board_id: None, .. } => true,
            ServerNotice::Other(_) => false,
        }
    }
}

/// Lifecycle of the board-scoped subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Joined { board_id: String },
    Leaving,
}

impl ListenerState {
    pub fn joined_board(&self) -> Option<&str> {
        match self {
            ListenerState::Joined { board_id } => Some(board_id),
            _ => None,
        }
    }
}
