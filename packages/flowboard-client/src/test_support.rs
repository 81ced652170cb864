//! In-memory stand-ins for the backend and the notification transport.
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flowboard_core::{Board, BoardSummary, Card, CardMove, List, StoreEvent};
use flowboard_core::sync::{ClientNotice, ServerNotice};
use tokio::sync::{broadcast, mpsc, Semaphore};

use crate::api::{ApiError, BoardApi};
use crate::listener::{NotificationTransport, TransportError, TransportEvent};

pub fn board(lists: &[(&str, &[&str])]) -> Board {
    let mut board = Board::new("b1", "Test board");
    for (list_id, cards) in lists {
        let mut list = List::new(*list_id, list_id.to_uppercase());
        for card_id in *cards {
            list.cards.push(Card::new(*card_id, card_id.to_uppercase(), *list_id));
        }
        board.lists.push(list);
    }
    board
}

pub fn drain(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

/// Poll `cond` until it holds, failing the test after two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[derive(Default)]
struct ServerState {
    boards: HashMap<String, Board>,
    next_id: usize,
    failing: HashSet<&'static str>,
    calls: Vec<String>,
}

/// Backend double with real (server-side) move semantics.
///
/// Fetches and card moves can be gated: while gated, each call waits for a
/// permit released by the test.
pub struct MockApi {
    state: Mutex<ServerState>,
    fetches: AtomicUsize,
    gate_fetches: AtomicBool,
    fetch_permits: Semaphore,
    gate_moves: AtomicBool,
    move_permits: Semaphore,
}

fn server_error(message: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        message: message.to_string(),
    }
}

impl MockApi {
    pub fn with_board(board: Board) -> Arc<Self> {
        let mut state = ServerState::default();
        state.boards.insert(board.id.clone(), board);
        Arc::new(Self {
            state: Mutex::new(state),
            fetches: AtomicUsize::new(0),
            gate_fetches: AtomicBool::new(false),
            fetch_permits: Semaphore::new(0),
            gate_moves: AtomicBool::new(false),
            move_permits: Semaphore::new(0),
        })
    }

    /// Make every subsequent call of `op` fail with a 500.
    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn add_board(&self, board: Board) {
        self.state.lock().unwrap().boards.insert(board.id.clone(), board);
    }

    pub fn heal(&self, op: &'static str) {
        self.state.lock().unwrap().failing.remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn server_board(&self, board_id: &str) -> Board {
        self.state.lock().unwrap().boards[board_id].clone()
    }

    /// Change the server's board as another client would.
    pub fn server_mutate(&self, board_id: &str, f: impl FnOnce(&mut Board)) {
        let mut state = self.state.lock().unwrap();
        f(state.boards.get_mut(board_id).unwrap());
    }

    pub fn gate_fetches(&self) {
        self.gate_fetches.store(true, Ordering::SeqCst);
    }

    pub fn release_fetches(&self, n: usize) {
        self.fetch_permits.add_permits(n);
    }

    pub fn gate_moves(&self) {
        self.gate_moves.store(true, Ordering::SeqCst);
    }

    pub fn release_moves(&self, n: usize) {
        self.move_permits.add_permits(n);
    }

    fn begin(&self, op: &'static str, call: String) -> Result<std::sync::MutexGuard<'_, ServerState>, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(op) {
            return Err(server_error(&format!("{} failed", op)));
        }
        state.calls.push(call);
        Ok(state)
    }

    fn next_id(state: &mut ServerState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }

    fn board_of_list<'a>(state: &'a mut ServerState, list_id: &str) -> Option<&'a mut Board> {
        state
            .boards
            .values_mut()
            .find(|b| b.lists.iter().any(|l| l.id == list_id))
    }
}

#[async_trait]
impl BoardApi for MockApi {
    async fn fetch_board(&self, board_id: &str) -> Result<Board, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // Snapshot is taken when the request reaches the server.
        let board = {
            let state = self.state.lock().unwrap();
            if state.failing.contains("fetch_board") {
                return Err(server_error("fetch_board failed"));
            }
            state.boards.get(board_id).cloned()
        };
        if self.gate_fetches.load(Ordering::SeqCst) {
            self.fetch_permits.acquire().await.unwrap().forget();
        }
        board.ok_or_else(|| ApiError::Status {
            status: 404,
            message: "Board not found".into(),
        })
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.failing.contains("list_boards") {
            return Err(server_error("list_boards failed"));
        }
        let mut items: Vec<BoardSummary> = state
            .boards
            .values()
            .map(|b| BoardSummary {
                id: b.id.clone(),
                title: b.title.clone(),
            })
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn create_board(&self, title: &str) -> Result<BoardSummary, ApiError> {
        let mut state = self.begin("create_board", format!("create_board {}", title))?;
        let id = Self::next_id(&mut state, "board");
        state.boards.insert(id.clone(), Board::new(id.clone(), title));
        Ok(BoardSummary {
            id,
            title: title.to_string(),
        })
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), ApiError> {
        let mut state = self.begin("delete_board", format!("delete_board {}", board_id))?;
        state
            .boards
            .remove(board_id)
            .map(|_| ())
            .ok_or_else(|| server_error("Board not found"))
    }

    async fn create_card(&self, list_id: &str, title: &str) -> Result<Card, ApiError> {
        let mut state = self.begin("create_card", format!("create_card {} {}", list_id, title))?;
        let id = Self::next_id(&mut state, "card");
        let card = Card::new(id, title, list_id);
        let board = Self::board_of_list(&mut state, list_id).ok_or_else(|| server_error("List not found"))?;
        if let Some(list) = board.lists.iter_mut().find(|l| l.id == list_id) {
            list.cards.push(card.clone());
        }
        Ok(card)
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), ApiError> {
        let mut state = self.begin("delete_card", format!("delete_card {}", card_id))?;
        for board in state.boards.values_mut() {
            for list in &mut board.lists {
                list.cards.retain(|c| c.id != card_id);
            }
        }
        Ok(())
    }

    async fn move_card(&self, mv: &CardMove) -> Result<(), ApiError> {
        if self.gate_moves.load(Ordering::SeqCst) {
            self.move_permits.acquire().await.unwrap().forget();
        }
        let mut state = self.begin(
            "move_card",
            format!(
                "move_card {} {}->{}@{}",
                mv.card_id, mv.source_list_id, mv.destination_list_id, mv.destination_index
            ),
        )?;
        let board = Self::board_of_list(&mut state, &mv.source_list_id)
            .ok_or_else(|| server_error("List not found"))?;
        let mut moved = None;
        for list in &mut board.lists {
            if let Some(pos) = list.cards.iter().position(|c| c.id == mv.card_id) {
                moved = Some(list.cards.remove(pos));
            }
        }
        let mut card = moved.ok_or_else(|| server_error("Card not found"))?;
        let dest = board
            .lists
            .iter_mut()
            .find(|l| l.id == mv.destination_list_id)
            .ok_or_else(|| server_error("List not found"))?;
        card.list = dest.id.clone();
        let index = mv.destination_index.min(dest.cards.len());
        dest.cards.insert(index, card);
        Ok(())
    }

    async fn create_list(&self, board_id: &str, title: &str) -> Result<List, ApiError> {
        let mut state = self.begin("create_list", format!("create_list {} {}", board_id, title))?;
        let id = Self::next_id(&mut state, "list");
        let list = List::new(id, title);
        let board = state
            .boards
            .get_mut(board_id)
            .ok_or_else(|| server_error("Board not found"))?;
        board.lists.push(list.clone());
        Ok(list)
    }

    async fn update_list_title(&self, list_id: &str, title: &str) -> Result<List, ApiError> {
        let mut state = self.begin("update_list_title", format!("update_list_title {} {}", list_id, title))?;
        let board = Self::board_of_list(&mut state, list_id).ok_or_else(|| server_error("List not found"))?;
        let list = board
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| server_error("List not found"))?;
        list.title = title.to_string();
        let mut canonical = list.clone();
        canonical.cards.clear();
        Ok(canonical)
    }

    async fn delete_list(&self, list_id: &str) -> Result<(), ApiError> {
        let mut state = self.begin("delete_list", format!("delete_list {}", list_id))?;
        for board in state.boards.values_mut() {
            board.lists.retain(|l| l.id != list_id);
        }
        Ok(())
    }

    async fn reorder_lists(&self, board_id: &str, ordered_list_ids: &[String]) -> Result<(), ApiError> {
        let mut state = self.begin(
            "reorder_lists",
            format!("reorder_lists {} [{}]", board_id, ordered_list_ids.join(",")),
        )?;
        let board = state
            .boards
            .get_mut(board_id)
            .ok_or_else(|| server_error("Board not found"))?;
        let mut lists = std::mem::take(&mut board.lists);
        for id in ordered_list_ids {
            if let Some(pos) = lists.iter().position(|l| &l.id == id) {
                board.lists.push(lists.remove(pos));
            }
        }
        board.lists.extend(lists);
        Ok(())
    }

    async fn generate_subtasks(&self, title: &str) -> Result<String, ApiError> {
        let _state = self.begin("generate_subtasks", format!("generate_subtasks {}", title))?;
        Ok(format!("1. {}: step one", title))
    }
}

/// Test side of a `MockTransport`.
#[derive(Clone)]
pub struct MockTransportHandle {
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: Arc<Mutex<Vec<ClientNotice>>>,
    closed: Arc<AtomicBool>,
    rejecting: Arc<AtomicBool>,
}

impl MockTransportHandle {
    pub fn connect(&self) {
        let _ = self.events.send(TransportEvent::Connected);
    }

    pub fn disconnect(&self) {
        let _ = self.events.send(TransportEvent::Disconnected("test".into()));
    }

    pub fn signal(&self, board_id: Option<&str>) {
        let _ = self.events.send(TransportEvent::Notice(ServerNotice::BoardUpdated {
            board_id: board_id.map(str::to_string),
            message: Some("Board updated".into()),
        }));
    }

    /// Make sends fail as if the socket had gone away.
    pub fn reject_sends(&self, reject: bool) {
        self.rejecting.store(reject, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<ClientNotice> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct MockTransport {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    sent: Arc<Mutex<Vec<ClientNotice>>>,
    closed: Arc<AtomicBool>,
    rejecting: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> (Self, MockTransportHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let rejecting = Arc::new(AtomicBool::new(false));
        (
            Self {
                events: rx,
                sent: sent.clone(),
                closed: closed.clone(),
                rejecting: rejecting.clone(),
            },
            MockTransportHandle {
                events: tx,
                sent,
                closed,
                rejecting,
            },
        )
    }
}

#[async_trait]
impl NotificationTransport for MockTransport {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    async fn send(&mut self, notice: ClientNotice) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) || self.rejecting.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        self.sent.lock().unwrap().push(notice);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
