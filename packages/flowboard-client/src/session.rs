/// Board session: the intents a UI invokes against one open board.
///
/// Moves and reorders follow optimistic-then-confirm: the store changes
/// first, then the request goes out. A failed confirmation is reported on the
/// store's event channel and logged; the optimistic state stays until the
/// next full fetch replaces it. Create/update/delete requests go through a
/// pending → fulfilled | rejected lifecycle and merge the server's entity on
/// fulfilment.
use std::future::Future;
use std::sync::Arc;

use flowboard_core::drag;
use flowboard_core::mutate;
use flowboard_core::{
    Board, BoardStore, Card, CardMove, DragGesture, List, ListReorder, MoveInstruction, RequestOp,
    RequestPhase,
};

use crate::api::{ApiError, BoardApi};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("No board is loaded")]
    NotLoaded,
}

/// What became of a move or reorder after its optimistic update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// No board was loaded; nothing was changed or sent.
    NotLoaded,
    Confirmed,
    /// The server refused; the local guess was kept.
    Rejected(String),
}

pub struct BoardSession {
    api: Arc<dyn BoardApi>,
    store: Arc<BoardStore>,
}

fn clean_title(title: &str) -> Result<&str, SessionError> {
    let title = title.trim();
    if title.is_empty() {
        Err(SessionError::EmptyTitle)
    } else {
        Ok(title)
    }
}

impl BoardSession {
    pub fn new(api: Arc<dyn BoardApi>, store: Arc<BoardStore>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Arc<BoardStore> {
        &self.store
    }

    pub fn api(&self) -> &Arc<dyn BoardApi> {
        &self.api
    }

    /// Fetch `board_id` and install it wholesale.
    pub async fn load(&self, board_id: &str) -> Result<(), SessionError> {
        self.store.begin_fetch(board_id);
        match self.api.fetch_board(board_id).await {
            Ok(board) => {
                log::debug!(
                    target: "flowboard.session",
                    "Fetched board {} ({} lists, {} cards)",
                    board_id,
                    board.lists.len(),
                    board.card_count()
                );
                self.store.finish_fetch(board);
                Ok(())
            }
            Err(e) => {
                self.store.fail_fetch(board_id, e.message());
                Err(e.into())
            }
        }
    }

    /// Resolve a finished drag gesture, apply it locally and persist it.
    ///
    /// Returns the instruction that was executed, or `None` when the gesture
    /// did not resolve to a move.
    pub async fn drop_gesture(&self, gesture: &DragGesture) -> Option<MoveInstruction> {
        let instruction = self.store.read(|board| drag::resolve(board, gesture))?;
        match &instruction {
            MoveInstruction::MoveCard(mv) => {
                self.move_card(mv.clone()).await;
            }
            MoveInstruction::ReorderLists(reorder) => {
                self.reorder_lists(reorder.clone()).await;
            }
        }
        Some(instruction)
    }

    pub async fn move_card(&self, mv: CardMove) -> Confirmation {
        if self
            .store
            .mutate(|board| mutate::apply_card_move(board, &mv))
            .is_none()
        {
            log::debug!(target: "flowboard.session", "Ignoring move of card {}: no board loaded", mv.card_id);
            return Confirmation::NotLoaded;
        }

        self.confirm(RequestOp::MoveCard, self.api.move_card(&mv)).await
    }

    /// Reorder locally, then persist the full resulting order.
    pub async fn reorder_lists(&self, reorder: ListReorder) -> Confirmation {
        let mut ordered = None;
        let applied = self.store.mutate(|board| {
            let changed = mutate::apply_list_reorder(board, &reorder);
            ordered = Some((board.id.clone(), board.list_ids()));
            changed
        });
        let (Some(_), Some((board_id, ordered_ids))) = (applied, ordered) else {
            log::debug!(target: "flowboard.session", "Ignoring reorder of list {}: no board loaded", reorder.active);
            return Confirmation::NotLoaded;
        };

        self.confirm(
            RequestOp::ReorderLists,
            self.api.reorder_lists(&board_id, &ordered_ids),
        )
        .await
    }

    async fn confirm(
        &self,
        op: RequestOp,
        request: impl Future<Output = Result<(), ApiError>>,
    ) -> Confirmation {
        self.store.record_request(op, RequestPhase::Pending);
        match request.await {
            Ok(()) => {
                self.store.record_request(op, RequestPhase::Fulfilled);
                Confirmation::Confirmed
            }
            Err(e) => {
                let message = e.message();
                self.store.record_mutation_failure(op, message.clone());
                Confirmation::Rejected(message)
            }
        }
    }

    /// Run a request through its lifecycle and fold the result into the
    /// snapshot on success.
    async fn run<T>(
        &self,
        op: RequestOp,
        request: impl Future<Output = Result<T, ApiError>>,
        merge: impl FnOnce(&mut Board, &T) -> bool,
    ) -> Result<T, SessionError> {
        self.store.record_request(op, RequestPhase::Pending);
        match request.await {
            Ok(value) => {
                // A board left in the meantime simply does not get the merge.
                self.store.mutate(|board| merge(board, &value));
                self.store.record_request(op, RequestPhase::Fulfilled);
                Ok(value)
            }
            Err(e) => {
                self.store.record_mutation_failure(op, e.message());
                Err(e.into())
            }
        }
    }

    fn loaded_board_id(&self) -> Result<String, SessionError> {
        self.store
            .read(|board| board.map(|b| b.id.clone()))
            .ok_or(SessionError::NotLoaded)
    }

    pub async fn add_card(&self, list_id: &str, title: &str) -> Result<Card, SessionError> {
        let title = clean_title(title)?;
        self.run(
            RequestOp::AddCard,
            self.api.create_card(list_id, title),
            |board, card| mutate::merge_created_card(board, card.clone()),
        )
        .await
    }

    pub async fn add_list(&self, title: &str) -> Result<List, SessionError> {
        let title = clean_title(title)?;
        let board_id = self.loaded_board_id()?;
        self.run(
            RequestOp::AddList,
            self.api.create_list(&board_id, title),
            |board, list| mutate::merge_created_list(board, list.clone()),
        )
        .await
    }

    pub async fn update_list_title(&self, list_id: &str, title: &str) -> Result<List, SessionError> {
        let title = clean_title(title)?;
        self.run(
            RequestOp::UpdateListTitle,
            self.api.update_list_title(list_id, title),
            |board, list| mutate::rename_list(board, &list.id, &list.title),
        )
        .await
    }

    pub async fn delete_list(&self, list_id: &str) -> Result<(), SessionError> {
        self.run(
            RequestOp::DeleteList,
            self.api.delete_list(list_id),
            |board, _| mutate::remove_list(board, list_id),
        )
        .await
    }

    pub async fn delete_card(&self, list_id: &str, card_id: &str) -> Result<(), SessionError> {
        self.run(
            RequestOp::DeleteCard,
            self.api.delete_card(card_id),
            |board, _| mutate::remove_card(board, list_id, card_id),
        )
        .await
    }

    /// Generate subtask text for a card and attach it.
    pub async fn generate_subtasks(&self, card_id: &str, title: &str) -> Result<String, SessionError> {
        let title = clean_title(title)?;
        self.run(
            RequestOp::GenerateSubtasks,
            self.api.generate_subtasks(title),
            |board, subtasks| mutate::set_card_subtasks(board, card_id, subtasks),
        )
        .await
    }
}
