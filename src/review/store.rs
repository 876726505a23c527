//! Storage seam for the review ledger.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::error::Result;
use crate::notes::types::{KnowledgeCard, ReviewRecord};
use crate::notes::{cards, reviews};

/// What the ledger coordinator needs from storage.
pub trait ReviewStore {
    /// A card by id, soft-deleted ones included.
    fn get_card(&self, id: &str) -> Result<Option<KnowledgeCard>>;

    /// Insert the card or overwrite the stored copy.
    fn put_card(&self, card: &KnowledgeCard) -> Result<()>;

    /// Insert a ledger record. Records are never updated.
    fn append_review(&self, review: &ReviewRecord) -> Result<()>;

    /// Non-deleted cards that are unscheduled or due at or before `as_of`.
    fn due_cards(&self, as_of: &DateTime<Utc>) -> Result<Vec<KnowledgeCard>>;

    /// A card's ledger, most recent first.
    fn reviews_for_card(&self, card_id: &str) -> Result<Vec<ReviewRecord>>;

    fn count_reviews(&self, card_id: &str) -> Result<u64>;

    /// Run `f` as one unit of work.
    ///
    /// The default has no rollback: effects of `f` before a failure remain.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T>,
    {
        f(self)
    }
}

/// [`ReviewStore`] over a SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection, for the rest of the notes API.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl ReviewStore for SqliteStore {
    fn get_card(&self, id: &str) -> Result<Option<KnowledgeCard>> {
        cards::get_card(&self.conn, id)
    }

    fn put_card(&self, card: &KnowledgeCard) -> Result<()> {
        cards::put_card(&self.conn, card)
    }

    fn append_review(&self, review: &ReviewRecord) -> Result<()> {
        reviews::append_review(&self.conn, review)
    }

    fn due_cards(&self, as_of: &DateTime<Utc>) -> Result<Vec<KnowledgeCard>> {
        cards::due_cards(&self.conn, as_of)
    }

    fn reviews_for_card(&self, card_id: &str) -> Result<Vec<ReviewRecord>> {
        reviews::reviews_by_card(&self.conn, card_id)
    }

    fn count_reviews(&self, card_id: &str) -> Result<u64> {
        reviews::count_reviews_by_card(&self.conn, card_id)
    }

    /// Commits if `f` succeeds, rolls back otherwise.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }
}
