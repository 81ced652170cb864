/// Lookups over a board snapshot.
///
/// Every lookup is a linear scan over lists and cards. Boards hold tens of
/// lists and cards, so no secondary index is kept. All entry points accept
/// `Option<&Board>` and answer `None` when no snapshot is loaded.
use std::collections::HashSet;

use crate::types::{Board, Card, List};

/// Where a card currently sits.
#[derive(Debug, Clone, Copy)]
pub struct CardLocation<'a> {
    pub list: &'a List,
    pub card: &'a Card,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Card {card_id} sits in list {holder} but points at list {points_to}")]
    BackReference {
        card_id: String,
        holder: String,
        points_to: String,
    },

    #[error("Card {0} appears more than once on the board")]
    DuplicateCard(String),

    #[error("List {0} appears more than once on the board")]
    DuplicateList(String),
}

pub fn find_list<'a>(board: Option<&'a Board>, list_id: &str) -> Option<&'a List> {
    board?.lists.iter().find(|l| l.id == list_id)
}

pub fn list_index(board: Option<&Board>, list_id: &str) -> Option<usize> {
    board?.lists.iter().position(|l| l.id == list_id)
}

pub fn find_card<'a>(board: Option<&'a Board>, card_id: &str) -> Option<CardLocation<'a>> {
    board?.lists.iter().find_map(|list| {
        index_of(list, card_id).map(|index| CardLocation {
            list,
            card: &list.cards[index],
            index,
        })
    })
}

pub fn index_of(list: &List, card_id: &str) -> Option<usize> {
    list.cards.iter().position(|c| c.id == card_id)
}

/// The list that either contains `id` as a card or is itself `id`.
pub fn list_containing<'a>(board: Option<&'a Board>, id: &str) -> Option<&'a List> {
    board?
        .lists
        .iter()
        .find(|l| l.id == id || l.cards.iter().any(|c| c.id == id))
}

/// Verify back-references and uniqueness of every list and card.
pub fn check_invariants(board: &Board) -> Result<(), InvariantViolation> {
    let mut list_ids = HashSet::new();
    let mut card_ids = HashSet::new();

    for list in &board.lists {
        if !list_ids.insert(list.id.as_str()) {
            return Err(InvariantViolation::DuplicateList(list.id.clone()));
        }
        for card in &list.cards {
            if !card_ids.insert(card.id.as_str()) {
                return Err(InvariantViolation::DuplicateCard(card.id.clone()));
            }
            if card.list != list.id {
                return Err(InvariantViolation::BackReference {
                    card_id: card.id.clone(),
                    holder: list.id.clone(),
                    points_to: card.list.clone(),
                });
            }
        }
    }
    Ok(())
}
