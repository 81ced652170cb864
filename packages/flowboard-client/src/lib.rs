//! Flowboard client: HTTP access to the board service, the per-board session
//! that drives optimistic updates, and the live change subscription that
//! keeps a board view in step with other clients.
pub mod api;
pub mod config;
pub mod directory;
pub mod listener;
pub mod refetch;
pub mod session;
pub mod socketio;
pub mod view;
pub mod ws_transport;

#[cfg(test)]
mod test_support;

pub use api::{ApiError, BoardApi, HttpBoardApi};
pub use config::ClientConfig;
pub use directory::DirectorySession;
pub use session::{BoardSession, Confirmation, SessionError};
pub use view::BoardView;
