//! Flowboard core: board model, drag resolution, optimistic mutation and the
//! board state store. No I/O happens here; see `flowboard-client` for the
//! network side.
pub mod directory;
pub mod drag;
pub mod mutate;
pub mod position;
pub mod store;
pub mod sync;
pub mod types;

pub use drag::{CardMove, DragGesture, DragItem, DragKind, DropTarget, ListReorder, MoveInstruction};
pub use store::{BoardStore, LoadStatus, RequestOp, RequestPhase, StoreEvent};
pub use types::{Board, BoardSummary, Card, List};
