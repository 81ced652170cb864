/// Drag resolution: turns the outcome of a drag gesture (the dragged item and
/// the droppable it was released over) into a semantic move.
///
/// Pointer collision data is imprecise. The "over" target may be a card, a
/// list, or a stale id the board no longer knows about. Resolution never
/// fails; anything that cannot be mapped to a destination is a no-op.
use crate::position::{find_card, index_of, list_containing};
use crate::types::Board;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    List,
    Card,
}

/// The item being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragItem {
    pub id: String,
    pub kind: DragKind,
}

/// The droppable the item was released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub id: String,
    /// Sortable container reported by the drag layer (the list a card target
    /// lives in). Only consulted when `id` matches nothing on the board.
    pub container: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGesture {
    pub active: DragItem,
    pub over: Option<DropTarget>,
}

impl DragGesture {
    pub fn card(card_id: impl Into<String>, over: Option<DropTarget>) -> Self {
        Self {
            active: DragItem {
                id: card_id.into(),
                kind: DragKind::Card,
            },
            over,
        }
    }

    pub fn list(list_id: impl Into<String>, over: Option<DropTarget>) -> Self {
        Self {
            active: DragItem {
                id: list_id.into(),
                kind: DragKind::List,
            },
            over,
        }
    }
}

impl DropTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            container: None,
        }
    }

    pub fn in_container(id: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            container: Some(container.into()),
        }
    }
}

/// Move a card to `destination_index` of `destination_list_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMove {
    pub card_id: String,
    pub source_list_id: String,
    pub destination_list_id: String,
    pub destination_index: usize,
}

/// Move list `active` to where list `over` currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReorder {
    pub active: String,
    pub over: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveInstruction {
    MoveCard(CardMove),
    ReorderLists(ListReorder),
}

/// Resolve a finished gesture against the current snapshot.
pub fn resolve(board: Option<&Board>, gesture: &DragGesture) -> Option<MoveInstruction> {
    let over = gesture.over.as_ref()?;
    if gesture.active.id == over.id {
        return None;
    }

    match gesture.active.kind {
        DragKind::List => Some(MoveInstruction::ReorderLists(ListReorder {
            active: gesture.active.id.clone(),
            over: over.id.clone(),
        })),
        DragKind::Card => resolve_card(board, &gesture.active.id, over).map(MoveInstruction::MoveCard),
    }
}

fn resolve_card(board: Option<&Board>, card_id: &str, over: &DropTarget) -> Option<CardMove> {
    let source = find_card(board, card_id)?;
    let source_list_id = source.card.list.clone();

    let (destination_list_id, destination_index) = match list_containing(board, &over.id) {
        Some(list) => {
            let index = index_of(list, &over.id).unwrap_or(list.cards.len());
            (list.id.clone(), index)
        }
        None => {
            // Over id unknown to the snapshot; trust the drag layer's container.
            let container = over.container.as_deref().filter(|c| !c.is_empty())?;
            (container.to_string(), 0)
        }
    };

    Some(CardMove {
        card_id: card_id.to_string(),
        source_list_id,
        destination_list_id,
        destination_index,
    })
}
