/// Board directory: the list of boards shown before one is opened.
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::store::LoadStatus;
use crate::types::BoardSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DirectoryEvent {
    StatusChanged { status: LoadStatus },
    ItemsChanged,
}

#[derive(Debug, Default)]
struct DirectoryState {
    items: Vec<BoardSummary>,
    status: LoadStatus,
    error: Option<String>,
}

pub struct BoardDirectory {
    state: Mutex<DirectoryState>,
    event_tx: broadcast::Sender<DirectoryEvent>,
}

impl Default for BoardDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardDirectory {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(DirectoryState::default()),
            event_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, status: LoadStatus, error: Option<String>) {
        {
            let mut state = self.lock();
            state.status = status;
            state.error = error;
        }
        let _ = self.event_tx.send(DirectoryEvent::StatusChanged { status });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.event_tx.subscribe()
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().status
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn items(&self) -> Vec<BoardSummary> {
        self.lock().items.clone()
    }

    /// Entries fit for display: both id and title present.
    pub fn visible(&self) -> Vec<BoardSummary> {
        self.lock()
            .items
            .iter()
            .filter(|b| !b.id.is_empty() && !b.title.is_empty())
            .cloned()
            .collect()
    }

    pub fn begin_fetch(&self) {
        self.set_status(LoadStatus::Loading, None);
    }

    pub fn finish_fetch(&self, items: Vec<BoardSummary>) {
        self.lock().items = items;
        self.set_status(LoadStatus::Succeeded, None);
        let _ = self.event_tx.send(DirectoryEvent::ItemsChanged);
    }

    pub fn fail_fetch(&self, message: impl Into<String>) {
        let message = message.into();
        log::error!(target: "flowboard.directory", "Failed to fetch boards: {}", message);
        self.set_status(LoadStatus::Failed, Some(message));
    }

    /// Append a board the server created, once.
    pub fn insert(&self, summary: BoardSummary) -> bool {
        let mut state = self.lock();
        if state.items.iter().any(|b| b.id == summary.id) {
            return false;
        }
        state.items.push(summary);
        drop(state);
        let _ = self.event_tx.send(DirectoryEvent::ItemsChanged);
        true
    }

    pub fn remove(&self, board_id: &str) -> bool {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|b| b.id != board_id);
        let changed = state.items.len() != before;
        drop(state);
        if changed {
            let _ = self.event_tx.send(DirectoryEvent::ItemsChanged);
        }
        changed
    }
}
