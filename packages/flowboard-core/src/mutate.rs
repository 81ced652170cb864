/// Local mutations of a board snapshot.
///
/// Move and reorder are applied before the server confirms them and are
/// never rolled back; the next full fetch corrects any divergence. The
/// `merge_*`/`remove_*` helpers fold server responses of create, update and
/// delete requests into the snapshot.
///
/// Every function returns whether the board changed. Lookups happen before
/// the first write, so a `false` result always leaves the board untouched.
use crate::drag::{CardMove, ListReorder, MoveInstruction};
use crate::position::{index_of, list_index};
use crate::types::{Board, Card, List};

pub fn apply(board: &mut Board, instruction: &MoveInstruction) -> bool {
    match instruction {
        MoveInstruction::MoveCard(mv) => apply_card_move(board, mv),
        MoveInstruction::ReorderLists(reorder) => apply_list_reorder(board, reorder),
    }
}

pub fn apply_card_move(board: &mut Board, mv: &CardMove) -> bool {
    let Some(src) = list_index(Some(board), &mv.source_list_id) else {
        return false;
    };
    let Some(dst) = list_index(Some(board), &mv.destination_list_id) else {
        return false;
    };
    let Some(from) = index_of(&board.lists[src], &mv.card_id) else {
        return false;
    };

    let mut card = board.lists[src].cards.remove(from);
    let cards = &mut board.lists[dst].cards;
    let to = mv.destination_index.min(cards.len());
    card.list = mv.destination_list_id.clone();
    cards.insert(to, card);

    src != dst || from != to
}

/// Splice `active` out, then splice it back in at the index `over` holds
/// after the removal.
///
/// This is a one-step approximation: for `[A, B, C]` dragging A onto C it
/// yields `[B, A, C]`, not `[B, C, A]`.
pub fn apply_list_reorder(board: &mut Board, reorder: &ListReorder) -> bool {
    if reorder.active == reorder.over {
        return false;
    }
    let Some(from) = list_index(Some(board), &reorder.active) else {
        return false;
    };
    if list_index(Some(board), &reorder.over).is_none() {
        return false;
    }

    let list = board.lists.remove(from);
    // `over` is still present after removing `active`.
    let to = list_index(Some(board), &reorder.over).unwrap_or(from);
    board.lists.insert(to, list);
    from != to
}

/// Append a card the server created. A card whose id is already on the
/// board (for instance brought in by a refetch) is not added again.
pub fn merge_created_card(board: &mut Board, card: Card) -> bool {
    if board
        .lists
        .iter()
        .any(|l| l.cards.iter().any(|c| c.id == card.id))
    {
        return false;
    }
    match board.lists.iter_mut().find(|l| l.id == card.list) {
        Some(list) => {
            list.cards.push(card);
            true
        }
        None => false,
    }
}

/// Append a list the server created, always starting without cards.
pub fn merge_created_list(board: &mut Board, mut list: List) -> bool {
    if board.lists.iter().any(|l| l.id == list.id) {
        return false;
    }
    list.cards.clear();
    board.lists.push(list);
    true
}

pub fn rename_list(board: &mut Board, list_id: &str, title: &str) -> bool {
    match board.lists.iter_mut().find(|l| l.id == list_id) {
        Some(list) if list.title != title => {
            list.title = title.to_string();
            true
        }
        _ => false,
    }
}

pub fn remove_list(board: &mut Board, list_id: &str) -> bool {
    let before = board.lists.len();
    board.lists.retain(|l| l.id != list_id);
    board.lists.len() != before
}

pub fn remove_card(board: &mut Board, list_id: &str, card_id: &str) -> bool {
    let Some(list) = board.lists.iter_mut().find(|l| l.id == list_id) else {
        return false;
    };
    let before = list.cards.len();
    list.cards.retain(|c| c.id != card_id);
    list.cards.len() != before
}

pub fn set_card_subtasks(board: &mut Board, card_id: &str, subtasks: &str) -> bool {
    for list in &mut board.lists {
        if let Some(card) = list.cards.iter_mut().find(|c| c.id == card_id) {
            card.subtasks = Some(subtasks.to_string());
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{check_invariants, find_card, tests::board};

    fn mv(card: &str, src: &str, dst: &str, index: usize) -> CardMove {
        CardMove {
            card_id: card.into(),
            source_list_id: src.into(),
            destination_list_id: dst.into(),
            destination_index: index,
        }
    }

    fn reorder(active: &str, over: &str) -> ListReorder {
        ListReorder {
            active: active.into(),
            over: over.into(),
        }
    }

    fn order(b: &Board) -> Vec<String> {
        b.list_ids()
    }

    #[test]
    fn test_move_card_to_empty_list() {
        let mut b = board(&[("a", &["c1", "c2"]), ("b", &[])]);
        assert!(apply_card_move(&mut b, &mv("c1", "a", "b", 0)));

        assert_eq!(b.lists[0].card_ids(), vec!["c2"]);
        assert_eq!(b.lists[1].card_ids(), vec!["c1"]);
        assert_eq!(b.lists[1].cards[0].list, "b");
        assert_eq!(check_invariants(&b), Ok(()));
    }

    #[test]
    fn test_move_card_clamps_index() {
        let mut b = board(&[("a", &["c1"]), ("b", &["c2", "c3"])]);
        assert!(apply_card_move(&mut b, &mv("c1", "a", "b", 99)));
        assert_eq!(b.lists[1].card_ids(), vec!["c2", "c3", "c1"]);
        assert_eq!(check_invariants(&b), Ok(()));
    }

    #[test]
    fn test_move_card_within_list() {
        let mut b = board(&[("a", &["c1", "c2", "c3"])]);
        assert!(apply_card_move(&mut b, &mv("c3", "a", "a", 0)));
        assert_eq!(b.lists[0].card_ids(), vec!["c3", "c1", "c2"]);

        assert!(apply_card_move(&mut b, &mv("c3", "a", "a", 2)));
        assert_eq!(b.lists[0].card_ids(), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_move_card_to_current_position_is_noop() {
        let mut b = board(&[("a", &["c1", "c2", "c3"])]);
        let before = b.clone();
        assert!(!apply_card_move(&mut b, &mv("c2", "a", "a", 1)));
        assert_eq!(b, before);
    }

    #[test]
    fn test_move_card_lands_at_destination_index_for_every_slot() {
        for index in 0..=3 {
            let mut b = board(&[("a", &["c1", "c2"]), ("b", &["c3", "c4", "c5"])]);
            apply_card_move(&mut b, &mv("c1", "a", "b", index));

            let loc = find_card(Some(&b), "c1").unwrap();
            assert_eq!(loc.list.id, "b");
            assert_eq!(loc.index, index);
            assert_eq!(loc.card.list, "b");
            assert_eq!(b.lists[0].card_ids(), vec!["c2"]);
            assert_eq!(b.card_count(), 5);
            assert_eq!(check_invariants(&b), Ok(()));
        }
    }

    #[test]
    fn test_move_card_with_unknown_ids_leaves_board_untouched() {
        let original = board(&[("a", &["c1"]), ("b", &[])]);
        for bad in [
            mv("c1", "a", "ghost", 0),
            mv("c1", "ghost", "b", 0),
            mv("ghost", "a", "b", 0),
            mv("c1", "b", "a", 0),
        ] {
            let mut b = original.clone();
            assert!(!apply_card_move(&mut b, &bad));
            assert_eq!(b, original);
        }
    }

    #[test]
    fn test_list_reorder_splice_approximation() {
        let mut b = board(&[("a", &[]), ("b", &[]), ("c", &[])]);
        assert!(apply_list_reorder(&mut b, &reorder("a", "c")));
        assert_eq!(order(&b), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_list_reorder_moving_left() {
        let mut b = board(&[("a", &[]), ("b", &[]), ("c", &[])]);
        assert!(apply_list_reorder(&mut b, &reorder("c", "a")));
        assert_eq!(order(&b), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_list_reorder_adjacent_right_is_unchanged() {
        // After removing A, B sits at 0; A goes back to 0.
        let mut b = board(&[("a", &[]), ("b", &[]), ("c", &[])]);
        assert!(!apply_list_reorder(&mut b, &reorder("a", "b")));
        assert_eq!(order(&b), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_list_reorder_noops() {
        let original = board(&[("a", &["c1"]), ("b", &[])]);
        for r in [reorder("a", "a"), reorder("a", "ghost"), reorder("ghost", "a")] {
            let mut b = original.clone();
            assert!(!apply_list_reorder(&mut b, &r));
            assert_eq!(b, original);
        }
    }

    #[test]
    fn test_list_reorder_keeps_cards() {
        let mut b = board(&[("a", &["c1"]), ("b", &["c2"]), ("c", &["c3"])]);
        apply(&mut b, &MoveInstruction::ReorderLists(reorder("c", "b")));
        assert_eq!(order(&b), vec!["a", "c", "b"]);
        assert_eq!(b.lists[1].card_ids(), vec!["c3"]);
        assert_eq!(check_invariants(&b), Ok(()));
    }

    #[test]
    fn test_merge_created_card_once() {
        let mut b = board(&[("a", &["c1"])]);
        let card = Card::new("c9", "New", "a");
        assert!(merge_created_card(&mut b, card.clone()));
        assert!(!merge_created_card(&mut b, card));
        assert_eq!(b.lists[0].card_ids(), vec!["c1", "c9"]);

        assert!(!merge_created_card(&mut b, Card::new("c10", "Lost", "ghost")));
    }

    #[test]
    fn test_merge_created_list_once_and_empty() {
        let mut b = board(&[("a", &[])]);
        let mut list = List::new("z", "Later");
        list.cards.push(Card::new("stray", "x", "z"));
        assert!(merge_created_list(&mut b, list.clone()));
        assert!(!merge_created_list(&mut b, list));
        assert_eq!(order(&b), vec!["a", "z"]);
        assert!(b.lists[1].cards.is_empty());
    }

    #[test]
    fn test_rename_and_remove() {
        let mut b = board(&[("a", &["c1", "c2"]), ("b", &[])]);
        assert!(rename_list(&mut b, "a", "Doing"));
        assert!(!rename_list(&mut b, "a", "Doing"));
        assert_eq!(b.lists[0].title, "Doing");

        assert!(remove_card(&mut b, "a", "c1"));
        assert!(!remove_card(&mut b, "b", "c2"));
        assert_eq!(b.lists[0].card_ids(), vec!["c2"]);

        assert!(remove_list(&mut b, "b"));
        assert!(!remove_list(&mut b, "b"));
        assert_eq!(order(&b), vec!["a"]);
    }

    #[test]
    fn test_set_card_subtasks() {
        let mut b = board(&[("a", &[]), ("b", &["c1"])]);
        assert!(set_card_subtasks(&mut b, "c1", "1. plan"));
        assert_eq!(b.lists[1].cards[0].subtasks.as_deref(), Some("1. plan"));
        assert!(!set_card_subtasks(&mut b, "ghost", "x"));
    }
}
