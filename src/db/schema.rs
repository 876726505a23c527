//! SQL DDL for all cardnotes tables.
//!
//! Defines `books`, `knowledge_cards`, `tree_nodes`, `review_records`, and
//! `schema_meta`. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL DEFAULT '',
    description TEXT,
    cover_image TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0 CHECK(is_deleted IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_deleted ON books(is_deleted);
CREATE INDEX IF NOT EXISTS idx_books_created ON books(created_at);

CREATE TABLE IF NOT EXISTS knowledge_cards (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    content TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    difficulty INTEGER NOT NULL DEFAULT 3,
    review_count INTEGER NOT NULL DEFAULT 0 CHECK(review_count >= 0),
    last_reviewed_at TEXT,
    next_review_at TEXT,
    interval INTEGER,
    ease_factor REAL,
    is_deleted INTEGER NOT NULL DEFAULT 0 CHECK(is_deleted IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cards_next_review ON knowledge_cards(next_review_at);
CREATE INDEX IF NOT EXISTS idx_cards_deleted ON knowledge_cards(is_deleted);
CREATE INDEX IF NOT EXISTS idx_cards_created ON knowledge_cards(created_at);

-- Card layout inside a book
CREATE TABLE IF NOT EXISTS tree_nodes (
    id TEXT PRIMARY KEY,
    card_id TEXT NOT NULL REFERENCES knowledge_cards(id) ON DELETE CASCADE,
    book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    parent_id TEXT REFERENCES tree_nodes(id) ON DELETE SET NULL,
    position_x REAL NOT NULL DEFAULT 0,
    position_y REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tree_card ON tree_nodes(card_id);
CREATE INDEX IF NOT EXISTS idx_tree_book ON tree_nodes(book_id);
CREATE INDEX IF NOT EXISTS idx_tree_parent ON tree_nodes(parent_id);

-- Review ledger (append-only)
CREATE TABLE IF NOT EXISTS review_records (
    id TEXT PRIMARY KEY,
    card_id TEXT NOT NULL REFERENCES knowledge_cards(id) ON DELETE CASCADE,
    difficulty INTEGER NOT NULL,
    interval INTEGER NOT NULL CHECK(interval >= 1),
    ease_factor REAL NOT NULL CHECK(ease_factor >= 1.3),
    next_review TEXT NOT NULL,
    reviewed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reviews_card ON review_records(card_id, reviewed_at);
CREATE INDEX IF NOT EXISTS idx_reviews_reviewed ON review_records(reviewed_at);

CREATE TRIGGER IF NOT EXISTS review_records_append_only
BEFORE UPDATE ON review_records
BEGIN
    SELECT RAISE(ABORT, 'review records are append-only');
END;

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
