/// Board-scoped change-notification listener.
///
/// State machine: Disconnected → Connecting → Joined(board) → Leaving →
/// Disconnected. The transport owns reconnection; whenever it reports a
/// (re)connect the listener joins the current board again. Every
/// `board_updated` signal for the joined board is handed to the `on_signal`
/// callback, which normally asks a `Refetcher` for a full reload.
///
/// Teardown (explicit `shutdown` or dropping the handle) always leaves the
/// room and closes the transport before the task ends.
use async_trait::async_trait;
use flowboard_core::sync::{ClientNotice, ListenerState, ServerNotice};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to encode notice: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Transport is not connected")]
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected(String),
    Notice(ServerNotice),
}

/// A live connection to the notification channel.
#[async_trait]
pub trait NotificationTransport: Send {
    /// Next event. `None` means the transport is closed for good.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    async fn send(&mut self, notice: ClientNotice) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

enum Command {
    Switch(String),
    Shutdown,
}

pub struct ChangeListener {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ListenerState>,
    task: JoinHandle<()>,
}

impl ChangeListener {
    pub fn spawn<T, F>(transport: T, board_id: impl Into<String>, on_signal: F) -> Self
    where
        T: NotificationTransport + 'static,
        F: Fn(&str) + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ListenerState::Disconnected);
        let worker = Worker {
            transport,
            board_id: board_id.into(),
            connected: false,
            on_signal,
            state_tx,
        };
        let task = tokio::spawn(worker.run(cmd_rx));
        Self {
            cmd_tx,
            state_rx,
            task,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state_rx.borrow().clone()
    }

    /// Receiver for observing state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ListenerState> {
        self.state_rx.clone()
    }

    /// Leave the current board's room and join `board_id`'s.
    pub fn switch_board(&self, board_id: impl Into<String>) {
        if self.cmd_tx.send(Command::Switch(board_id.into())).is_err() {
            log::warn!(target: "flowboard.listener", "Listener already stopped; switch ignored");
        }
    }

    /// Leave the room, close the transport and wait for the task to end.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            log::error!(target: "flowboard.listener", "Listener task failed: {}", e);
        }
    }
}

struct Worker<T, F> {
    transport: T,
    board_id: String,
    connected: bool,
    on_signal: F,
    state_tx: watch::Sender<ListenerState>,
}

impl<T, F> Worker<T, F>
where
    T: NotificationTransport,
    F: Fn(&str) + Send,
{
    fn set_state(&self, state: ListenerState) {
        log::debug!(target: "flowboard.listener", "State -> {:?}", state);
        self.state_tx.send_replace(state);
    }

    async fn notify(&mut self, notice: ClientNotice) -> bool {
        match self.transport.send(notice.clone()).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!(target: "flowboard.listener", "Failed to send {:?}: {}", notice, e);
                false
            }
        }
    }

    /// Join the current board's room. The state only becomes `Joined` once
    /// the server was actually told; otherwise it stays `Connecting` until
    /// the next (re)connect.
    async fn join(&mut self) {
        let board_id = self.board_id.clone();
        let sent = self
            .notify(ClientNotice::JoinBoard {
                board_id: board_id.clone(),
            })
            .await;
        if sent {
            log::info!(target: "flowboard.listener", "Joined board {}", board_id);
            self.set_state(ListenerState::Joined { board_id });
        } else {
            self.set_state(ListenerState::Connecting);
        }
    }

    async fn leave(&mut self) {
        let board_id = self.board_id.clone();
        let _ = self.notify(ClientNotice::LeaveBoard { board_id }).await;
    }

    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        self.set_state(ListenerState::Connecting);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Switch(next)) => {
                        if next == self.board_id {
                            continue;
                        }
                        if self.connected {
                            self.leave().await;
                        }
                        log::info!(
                            target: "flowboard.listener",
                            "Switching from board {} to {}",
                            self.board_id,
                            next
                        );
                        self.board_id = next;
                        if self.connected {
                            self.join().await;
                        }
                    }
                    Some(Command::Shutdown) | None => break,
                },
                event = self.transport.next_event() => match event {
                    Some(TransportEvent::Connected) => {
                        self.connected = true;
                        self.join().await;
                    }
                    Some(TransportEvent::Disconnected(reason)) => {
                        self.connected = false;
                        log::warn!(target: "flowboard.listener", "Disconnected: {}", reason);
                        self.set_state(ListenerState::Connecting);
                    }
                    Some(TransportEvent::Notice(notice)) => {
                        if self.connected && notice.invalidates(&self.board_id) {
                            log::info!(target: "flowboard.listener", "Board {} changed remotely", self.board_id);
                            (self.on_signal)(&self.board_id);
                        }
                    }
                    None => {
                        log::warn!(target: "flowboard.listener", "Transport closed");
                        self.connected = false;
                        self.set_state(ListenerState::Disconnected);
                        return;
                    }
                },
            }
        }

        self.set_state(ListenerState::Leaving);
        if self.connected {
            self.leave().await;
        }
        if let Err(e) = self.transport.close().await {
            log::warn!(target: "flowboard.listener", "Failed to close transport: {}", e);
        }
        self.connected = false;
        self.set_state(ListenerState::Disconnected);
    }
}
