#![allow(dead_code)]

use cardnotes::db;
use cardnotes::notes::{books, cards, NewBook, NewCard};
use cardnotes::review::{ManualClock, ReviewLedger, SqliteStore};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// A fixed instant used as "now" by ledger tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 12, 8, 30, 0).unwrap()
}

/// Insert a card with the given title. Returns the card ID.
pub fn insert_card(conn: &Connection, title: &str) -> String {
    cards::create_card(
        conn,
        &NewCard {
            title: title.to_string(),
            content: format!("Notes about {title}"),
            difficulty: 3,
            ..Default::default()
        },
    )
    .unwrap()
}

/// Insert a book with the given title. Returns the book ID.
pub fn insert_book(conn: &Connection, title: &str) -> String {
    books::create_book(
        conn,
        &NewBook {
            title: title.to_string(),
            author: "Test Author".to_string(),
            ..Default::default()
        },
    )
    .unwrap()
}

/// A ledger over a fresh database whose clock is frozen at [`t0`].
pub fn test_ledger() -> ReviewLedger<SqliteStore, ManualClock> {
    ReviewLedger::new(SqliteStore::new(test_db()), ManualClock::new(t0()))
}

/// Count all rows in `review_records`.
pub fn ledger_len(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM review_records", [], |row| row.get(0))
        .unwrap()
}
