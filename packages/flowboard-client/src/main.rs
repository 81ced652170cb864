/// flowboard-watch: open one board, follow remote changes and print the
/// board each time it changes.
///
/// Usage: flowboard-watch <board-id> [config-path]
use std::path::PathBuf;
use std::sync::Arc;

use flowboard_client::config::{default_config_path, load_config};
use flowboard_client::ws_transport::WsTransport;
use flowboard_client::{BoardSession, BoardView, HttpBoardApi};
use flowboard_core::{Board, BoardStore, StoreEvent};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

fn print_board(board: &Board) {
    println!("== {} ({}) ==", board.title, board.id);
    for list in &board.lists {
        println!("[{}] {} ({} cards)", list.id, list.title, list.cards.len());
        for card in &list.cards {
            println!("    - {} {}", card.id, card.title);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(board_id) = args.next() else {
        eprintln!("usage: flowboard-watch <board-id> [config-path]");
        std::process::exit(2);
    };
    let config_path = args.next().map(PathBuf::from).unwrap_or_else(default_config_path);
    let config = load_config(&config_path).with_env_overrides();
    log::info!(target: "flowboard.watch", "Using API at {}", config.api_base_url);

    let api = match HttpBoardApi::new(&config.api_base_url, config.request_timeout()) {
        Ok(api) => api,
        Err(e) => {
            log::error!(target: "flowboard.watch", "Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(BoardStore::new());
    let session = Arc::new(BoardSession::new(Arc::new(api), store.clone()));
    let mut events = BroadcastStream::new(store.subscribe());

    let transport = WsTransport::new(&config.notify_url(), config.reconnect_delay());
    let (view, loaded) = BoardView::open(session, transport, &board_id).await;
    match loaded {
        Ok(()) => {
            if let Some(board) = store.snapshot() {
                print_board(&board);
            }
        }
        Err(e) => log::error!(target: "flowboard.watch", "Initial load of {} failed: {}", board_id, e),
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!(target: "flowboard.watch", "Interrupted; closing board {}", board_id);
                break;
            }
            event = events.next() => match event {
                Some(Ok(StoreEvent::SnapshotReplaced { .. } | StoreEvent::SnapshotMutated { .. })) => {
                    if let Some(board) = store.snapshot() {
                        print_board(&board);
                    }
                }
                Some(Ok(StoreEvent::MutationFailed { op, message })) => {
                    log::warn!(target: "flowboard.watch", "{:?} rejected: {}", op, message);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!(target: "flowboard.watch", "Event stream lagged: {}", e);
                }
                None => break,
            },
        }
    }

    view.close().await;
}
