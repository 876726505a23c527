//! Records and data access: cards, books, card trees, the review ledger
//! tables, statistics, validation, and whole-dataset transfer.

pub mod books;
pub mod cards;
pub mod reviews;
pub mod stats;
pub mod transfer;
pub mod tree;
pub mod types;
pub mod validation;

pub use types::{
    Book, BookUpdate, CardUpdate, KnowledgeCard, NewBook, NewCard, NewTreeNode, Position,
    ReviewRecord, TreeNode,
};
