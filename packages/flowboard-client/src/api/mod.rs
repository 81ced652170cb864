/// REST contract the sync engine needs from the backend.
///
/// `HttpBoardApi` talks to the real server; tests substitute an in-memory
/// implementation.
use async_trait::async_trait;
use flowboard_core::{Board, BoardSummary, Card, CardMove, List};

pub mod http;

pub use http::HttpBoardApi;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Human readable message, preferring what the server said.
    pub fn message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Full board snapshot.
    async fn fetch_board(&self, board_id: &str) -> Result<Board, ApiError>;

    async fn list_boards(&self) -> Result<Vec<BoardSummary>, ApiError>;

    async fn create_board(&self, title: &str) -> Result<BoardSummary, ApiError>;

    async fn delete_board(&self, board_id: &str) -> Result<(), ApiError>;

    /// Returns the card as stored, including its server-assigned id.
    async fn create_card(&self, list_id: &str, title: &str) -> Result<Card, ApiError>;

    async fn delete_card(&self, card_id: &str) -> Result<(), ApiError>;

    /// Persist one card's new position. Sending the same move twice leaves
    /// the server in the same state.
    async fn move_card(&self, mv: &CardMove) -> Result<(), ApiError>;

    async fn create_list(&self, board_id: &str, title: &str) -> Result<List, ApiError>;

    async fn update_list_title(&self, list_id: &str, title: &str) -> Result<List, ApiError>;

    async fn delete_list(&self, list_id: &str) -> Result<(), ApiError>;

    /// Persist the complete list order of a board.
    async fn reorder_lists(&self, board_id: &str, ordered_list_ids: &[String]) -> Result<(), ApiError>;

    /// Ask the server to generate subtask text for a card title.
    async fn generate_subtasks(&self, title: &str) -> Result<String, ApiError>;
}
