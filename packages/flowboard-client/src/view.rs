/// An open board view: the session plus its live subscription.
///
/// Opening loads the board and starts one listener and one refetch worker;
/// `navigate` moves both to another board; `close` leaves the room, closes
/// the transport and drops the snapshot. Exactly one notification
/// connection exists per open view.
use std::sync::Arc;

use flowboard_core::sync::ListenerState;

use crate::listener::{ChangeListener, NotificationTransport};
use crate::refetch::Refetcher;
use crate::session::{BoardSession, SessionError};

pub struct BoardView {
    session: Arc<BoardSession>,
    listener: ChangeListener,
    refetcher: Refetcher,
}

impl BoardView {
    /// Start listening for `board_id` and load it.
    ///
    /// The view is returned even when the initial load fails; the store then
    /// reports `Failed` and a later `reload` or remote signal can recover.
    pub async fn open<T>(
        session: Arc<BoardSession>,
        transport: T,
        board_id: &str,
    ) -> (Self, Result<(), SessionError>)
    where
        T: NotificationTransport + 'static,
    {
        let refetcher = Refetcher::spawn(session.clone());
        let handle = refetcher.handle();
        let listener = ChangeListener::spawn(transport, board_id, move |_board_id: &str| {
            handle.request();
        });
        let loaded = session.load(board_id).await;
        (
            Self {
                session,
                listener,
                refetcher,
            },
            loaded,
        )
    }

    pub fn session(&self) -> &Arc<BoardSession> {
        &self.session
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener.state()
    }

    pub fn refetch(&self) -> bool {
        self.refetcher.request()
    }

    pub async fn reload(&self) -> Result<(), SessionError> {
        match self.session.store().board_id() {
            Some(board_id) => self.session.load(&board_id).await,
            None => Err(SessionError::NotLoaded),
        }
    }

    /// Switch to another board: leave the old room, join the new one, load.
    pub async fn navigate(&self, board_id: &str) -> Result<(), SessionError> {
        self.listener.switch_board(board_id);
        self.session.load(board_id).await
    }

    /// Tear the view down.
    pub async fn close(self) {
        let Self {
            session,
            listener,
            refetcher,
        } = self;
        // Listener first: it owns the last refetch handle.
        listener.shutdown().await;
        refetcher.shutdown().await;
        session.store().reset();
    }
}
