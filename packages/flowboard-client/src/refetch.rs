/// Coalescing refetch worker.
///
/// Remote-change signals ask for a full reload of the board the store is
/// showing. Requests go through a one-slot queue: while a fetch is in
/// flight at most one more is queued, and further signals fold into that
/// trailing fetch. Every completed fetch is installed, newest completion
/// last.
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::session::BoardSession;

/// Cloneable request side of a `Refetcher`.
#[derive(Clone)]
pub struct RefetchHandle {
    tx: mpsc::Sender<()>,
}

impl RefetchHandle {
    /// Ask for a reload. Returns `false` when the request folded into one
    /// already queued (or the worker is gone).
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                log::debug!(target: "flowboard.refetch", "Refetch already queued; coalesced");
                false
            }
            Err(TrySendError::Closed(())) => {
                log::warn!(target: "flowboard.refetch", "Refetch worker stopped; request dropped");
                false
            }
        }
    }
}

pub struct Refetcher {
    handle: RefetchHandle,
    task: JoinHandle<()>,
}

impl Refetcher {
    pub fn spawn(session: Arc<BoardSession>) -> Self {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let Some(board_id) = session.store().board_id() else {
                    log::debug!(target: "flowboard.refetch", "No board open; skipping refetch");
                    continue;
                };
                log::info!(target: "flowboard.refetch", "Refetching board {}", board_id);
                if let Err(e) = session.load(&board_id).await {
                    log::warn!(target: "flowboard.refetch", "Refetch of board {} failed: {}", board_id, e);
                }
            }
        });
        Self {
            handle: RefetchHandle { tx },
            task,
        }
    }

    pub fn handle(&self) -> RefetchHandle {
        self.handle.clone()
    }

    pub fn request(&self) -> bool {
        self.handle.request()
    }

    /// Stop accepting requests and wait for the worker. The worker finishes
    /// once every `RefetchHandle` is dropped.
    pub async fn shutdown(self) {
        let Self { handle, task } = self;
        drop(handle);
        if let Err(e) = task.await {
            log::error!(target: "flowboard.refetch", "Refetch task failed: {}", e);
        }
    }
}
