//! Record types for the four stored collections.
//!
//! [`KnowledgeCard`], [`Book`], [`TreeNode`], and [`ReviewRecord`] mirror their
//! tables one-to-one. The `New*` and `*Update` structs are the inputs accepted
//! by the CRUD modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A knowledge card together with its cached scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeCard {
    /// UUID v7 primary key.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Markdown body.
    pub content: String,
    /// Free-form tags. A tag equal to a book id files the card under that book.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author-assigned card difficulty (1–5). Unrelated to review quality.
    pub difficulty: u8,
    /// Completed reviews.
    #[serde(default)]
    pub review_count: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    /// Current spacing in days; `None` until set.
    pub interval: Option<u32>,
    pub ease_factor: Option<f64>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a knowledge card.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCard {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub difficulty: u8,
}

/// Partial update of a knowledge card's content fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub difficulty: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
}

/// Canvas coordinates of a tree node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A card placed in a book's tree layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub card_id: String,
    pub book_id: String,
    /// `None` for root nodes.
    pub parent_id: Option<String>,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTreeNode {
    pub card_id: String,
    pub book_id: String,
    pub parent_id: Option<String>,
    pub position: Position,
}

/// One entry of the review ledger. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: String,
    pub card_id: String,
    /// Recall quality given for this review (0 = blackout, 5 = perfect).
    pub difficulty: i32,
    /// Interval computed by this review, in days.
    pub interval: u32,
    /// Ease factor computed by this review.
    pub ease_factor: f64,
    /// Due date computed by this review.
    pub next_review: DateTime<Utc>,
    pub reviewed_at: DateTime<Utc>,
}
