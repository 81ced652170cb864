/// Board state store.
///
/// Holds the one authoritative in-memory snapshot of the open board together
/// with its load status. Every mutation runs inside a single critical
/// section, so observers never see a half-applied move. Changes are published
/// on a broadcast channel; consumers subscribe explicitly.
///
/// The store is passed around as `Arc<BoardStore>`; there is no global
/// instance.
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::drag::MoveInstruction;
use crate::mutate;
use crate::types::Board;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Requests the store reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestOp {
    FetchBoard,
    MoveCard,
    ReorderLists,
    AddCard,
    AddList,
    UpdateListTitle,
    DeleteList,
    DeleteCard,
    GenerateSubtasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPhase {
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    StatusChanged { status: LoadStatus },
    /// A fetch installed a new snapshot wholesale.
    SnapshotReplaced { board_id: String },
    /// A local mutation changed the snapshot in place.
    SnapshotMutated { board_id: String },
    Request { op: RequestOp, phase: RequestPhase },
    /// A write request was refused. Optimistic moves stay applied until the
    /// next fetch; creates and deletes leave the snapshot untouched.
    MutationFailed { op: RequestOp, message: String },
    Reset,
}

#[derive(Debug, Default)]
struct BoardState {
    /// Board the current or last fetch targets.
    board_id: Option<String>,
    snapshot: Option<Board>,
    status: LoadStatus,
    last_error: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
    /// A fetch of the already-loaded board is in flight. The snapshot stays
    /// visible and mutable meanwhile.
    refreshing: bool,
}

pub struct BoardStore {
    state: Mutex<BoardState>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(BoardState::default()),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        // Plain data; recover from poisoning.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: StoreEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().status
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn board_id(&self) -> Option<String> {
        self.lock().board_id.clone()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.lock().fetched_at
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Clone of the current snapshot, if one is loaded.
    pub fn snapshot(&self) -> Option<Board> {
        self.lock().snapshot.clone()
    }

    /// Run `f` against the current snapshot without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(Option<&Board>) -> R) -> R {
        let state = self.lock();
        f(state.snapshot.as_ref())
    }

    /// List ids of the loaded board in positional order.
    pub fn list_order(&self) -> Option<Vec<String>> {
        self.read(|board| board.map(Board::list_ids))
    }

    /// Mark a fetch of `board_id` as started.
    ///
    /// Refetching the board that is already loaded keeps the snapshot on
    /// screen and the status at `Succeeded`. Any other fetch drops the
    /// snapshot and moves to `Loading`.
    pub fn begin_fetch(&self, board_id: &str) {
        let mut state = self.lock();
        let loaded_same = state.status == LoadStatus::Succeeded
            && state.snapshot.as_ref().map_or(false, |b| b.id == board_id);

        state.board_id = Some(board_id.to_string());
        if loaded_same {
            state.refreshing = true;
            drop(state);
            log::debug!(target: "flowboard.store", "Refreshing board {}", board_id);
        } else {
            state.snapshot = None;
            state.status = LoadStatus::Loading;
            state.last_error = None;
            state.refreshing = false;
            drop(state);
            log::debug!(target: "flowboard.store", "Loading board {}", board_id);
            self.publish(StoreEvent::StatusChanged {
                status: LoadStatus::Loading,
            });
        }
        self.publish(StoreEvent::Request {
            op: RequestOp::FetchBoard,
            phase: RequestPhase::Pending,
        });
    }

    /// Install a fetched board, replacing whatever was there.
    ///
    /// Results install in completion order. A result for a board the store
    /// has navigated away from is discarded. Returns whether it was installed.
    pub fn finish_fetch(&self, board: Board) -> bool {
        let mut state = self.lock();
        if state.board_id.as_deref() != Some(board.id.as_str()) {
            let current = state.board_id.clone();
            drop(state);
            log::info!(
                target: "flowboard.store",
                "Discarding fetch of board {} (store now on {:?})",
                board.id,
                current
            );
            return false;
        }

        let board_id = board.id.clone();
        let was = state.status;
        state.snapshot = Some(board);
        state.status = LoadStatus::Succeeded;
        state.last_error = None;
        state.refreshing = false;
        state.fetched_at = Some(Utc::now());
        drop(state);

        if was != LoadStatus::Succeeded {
            self.publish(StoreEvent::StatusChanged {
                status: LoadStatus::Succeeded,
            });
        }
        self.publish(StoreEvent::Request {
            op: RequestOp::FetchBoard,
            phase: RequestPhase::Fulfilled,
        });
        self.publish(StoreEvent::SnapshotReplaced { board_id });
        true
    }

    /// Record a failed fetch. The board becomes unavailable until reloaded.
    pub fn fail_fetch(&self, board_id: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut state = self.lock();
        if state.board_id.as_deref() != Some(board_id) {
            return false;
        }
        state.snapshot = None;
        state.status = LoadStatus::Failed;
        state.last_error = Some(message.clone());
        state.refreshing = false;
        drop(state);

        log::error!(target: "flowboard.store", "Failed to load board {}: {}", board_id, message);
        self.publish(StoreEvent::StatusChanged {
            status: LoadStatus::Failed,
        });
        self.publish(StoreEvent::Request {
            op: RequestOp::FetchBoard,
            phase: RequestPhase::Rejected,
        });
        true
    }

    /// Mutate the loaded snapshot in one critical section.
    ///
    /// Returns `None` without calling `f` unless a snapshot is loaded and
    /// the status is `Succeeded`. Otherwise returns what `f` reported; `true`
    /// means the board changed and subscribers are told so.
    pub fn mutate(&self, f: impl FnOnce(&mut Board) -> bool) -> Option<bool> {
        let mut state = self.lock();
        if state.status != LoadStatus::Succeeded {
            return None;
        }
        let board = state.snapshot.as_mut()?;
        let changed = f(board);
        let board_id = board.id.clone();
        drop(state);

        if changed {
            self.publish(StoreEvent::SnapshotMutated { board_id });
        }
        Some(changed)
    }

    /// Apply a resolved move optimistically.
    pub fn apply(&self, instruction: &MoveInstruction) -> Option<bool> {
        self.mutate(|board| mutate::apply(board, instruction))
    }

    pub fn record_request(&self, op: RequestOp, phase: RequestPhase) {
        self.publish(StoreEvent::Request { op, phase });
    }

    pub fn record_mutation_failure(&self, op: RequestOp, message: impl Into<String>) {
        let message = message.into();
        log::error!(target: "flowboard.store", "{:?} failed: {}", op, message);
        self.publish(StoreEvent::Request {
            op,
            phase: RequestPhase::Rejected,
        });
        self.publish(StoreEvent::MutationFailed { op, message });
    }

    /// Drop the snapshot, e.g. on navigation away from the board.
    pub fn reset(&self) {
        *self.lock() = BoardState::default();
        self.publish(StoreEvent::Reset);
    }
}
