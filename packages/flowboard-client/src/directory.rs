/// Board directory session: list, create and delete boards.
use std::sync::Arc;

use flowboard_core::directory::BoardDirectory;
use flowboard_core::BoardSummary;

use crate::api::BoardApi;
use crate::session::SessionError;

pub struct DirectorySession {
    api: Arc<dyn BoardApi>,
    directory: Arc<BoardDirectory>,
}

impl DirectorySession {
    pub fn new(api: Arc<dyn BoardApi>, directory: Arc<BoardDirectory>) -> Self {
        Self { api, directory }
    }

    pub fn directory(&self) -> &Arc<BoardDirectory> {
        &self.directory
    }

    pub async fn fetch_all(&self) -> Result<Vec<BoardSummary>, SessionError> {
        self.directory.begin_fetch();
        match self.api.list_boards().await {
            Ok(items) => {
                log::debug!(target: "flowboard.directory", "Fetched {} boards", items.len());
                self.directory.finish_fetch(items.clone());
                Ok(items)
            }
            Err(e) => {
                log::warn!(target: "flowboard.directory", "Listing boards failed: {}", e);
                self.directory.fail_fetch(e.message());
                Err(e.into())
            }
        }
    }

    pub async fn create(&self, title: &str) -> Result<BoardSummary, SessionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        let summary = self.api.create_board(title).await?;
        log::info!(target: "flowboard.directory", "Created board {} ({})", summary.id, summary.title);
        self.directory.insert(summary.clone());
        Ok(summary)
    }

    pub async fn delete(&self, board_id: &str) -> Result<(), SessionError> {
        self.api.delete_board(board_id).await?;
        log::info!(target: "flowboard.directory", "Deleted board {}", board_id);
        self.directory.remove(board_id);
        Ok(())
    }
}
