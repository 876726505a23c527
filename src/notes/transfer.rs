//! Whole-dataset export and import.
//!
//! Import replaces every table inside one transaction; foreign keys are
//! deferred until commit so records may arrive in any order.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::types::{Book, KnowledgeCard, ReviewRecord, TreeNode};
use super::{books, cards, reviews, tree};
use crate::db::timestamp_now;
use crate::error::Result;

/// Export format.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportData {
    #[serde(default)]
    pub knowledge_cards: Vec<KnowledgeCard>,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub tree_nodes: Vec<TreeNode>,
    #[serde(default)]
    pub review_records: Vec<ReviewRecord>,
    pub exported_at: Option<DateTime<Utc>>,
}

/// Counts of records written by [`import_data`].
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub knowledge_cards: usize,
    pub books: usize,
    pub tree_nodes: usize,
    pub review_records: usize,
}

fn all<T>(
    conn: &Connection,
    sql: &str,
    map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Snapshot every record, soft-deleted ones included.
pub fn export_data(conn: &Connection) -> Result<ExportData> {
    let data = ExportData {
        knowledge_cards: all(
            conn,
            &format!("SELECT {} FROM knowledge_cards ORDER BY created_at, rowid", cards::CARD_COLUMNS),
            cards::card_from_row,
        )?,
        books: all(
            conn,
            &format!("SELECT {} FROM books ORDER BY created_at, rowid", books::BOOK_COLUMNS),
            books::book_from_row,
        )?,
        tree_nodes: all(
            conn,
            &format!("SELECT {} FROM tree_nodes ORDER BY created_at, rowid", tree::NODE_COLUMNS),
            tree::node_from_row,
        )?,
        review_records: all(
            conn,
            &format!("SELECT {} FROM review_records ORDER BY reviewed_at, rowid", reviews::REVIEW_COLUMNS),
            reviews::review_from_row,
        )?,
        exported_at: Some(timestamp_now()),
    };

    tracing::info!(
        cards = data.knowledge_cards.len(),
        books = data.books.len(),
        tree_nodes = data.tree_nodes.len(),
        reviews = data.review_records.len(),
        "dataset exported"
    );
    Ok(data)
}

pub fn export_json(conn: &Connection) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_data(conn)?)?)
}

/// Replace the whole dataset with `data`. Nothing changes if any record fails.
pub fn import_data(conn: &Connection, data: &ExportData) -> Result<ImportSummary> {
    let tx = conn.unchecked_transaction()?;
    tx.pragma_update(None, "defer_foreign_keys", "ON")?;

    tx.execute_batch(
        "DELETE FROM review_records;
         DELETE FROM tree_nodes;
         DELETE FROM knowledge_cards;
         DELETE FROM books;",
    )?;

    for book in &data.books {
        books::insert_book(&tx, book)?;
    }
    for card in &data.knowledge_cards {
        cards::put_card(&tx, card)?;
    }
    for node in &data.tree_nodes {
        tree::insert_node(&tx, node)?;
    }
    for review in &data.review_records {
        reviews::append_review(&tx, review)?;
    }

    tx.commit()?;

    let summary = ImportSummary {
        knowledge_cards: data.knowledge_cards.len(),
        books: data.books.len(),
        tree_nodes: data.tree_nodes.len(),
        review_records: data.review_records.len(),
    };
    tracing::info!(?summary, "dataset imported");
    Ok(summary)
}

pub fn import_json(conn: &Connection, json: &str) -> Result<ImportSummary> {
    let data: ExportData = serde_json::from_str(json)?;
    import_data(conn, &data)
}
