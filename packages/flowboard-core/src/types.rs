use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit of work inside a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    /// Identity of the owning list. Must match the list whose `cards`
    /// sequence holds this card.
    pub list: String,
    /// Generated annotation text (AI-produced subtasks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Entry of the board directory (home view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSummary {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl Card {
    pub fn new(id: impl Into<String>, title: impl Into<String>, list: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            list: list.into(),
            subtasks: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn same_content(&self, other: &Card) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.list == other.list
            && self.subtasks == other.subtasks
    }
}

impl List {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cards: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Card ids in positional order.
    pub fn card_ids(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn same_content(&self, other: &List) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.cards.len() == other.cards.len()
            && self.cards.iter().zip(&other.cards).all(|(a, b)| a.same_content(b))
    }
}

impl Board {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            lists: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// List ids in positional order. This is the payload of a list reorder.
    pub fn list_ids(&self) -> Vec<String> {
        self.lists.iter().map(|l| l.id.clone()).collect()
    }

    /// Structural equality that ignores server timestamp fields.
    pub fn same_content(&self, other: &Board) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.lists.len() == other.lists.len()
            && self.lists.iter().zip(&other.lists).all(|(a, b)| a.same_content(b))
    }

    /// Total number of cards across all lists.
    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|l| l.cards.len()).sum()
    }
}
