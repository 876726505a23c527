pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Open (or create) the cardnotes database at the given path, with schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a migrated in-memory database. Each call yields an isolated store.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Current wall-clock time at storage precision (milliseconds).
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Milliseconds since the epoch of `9999-12-31T23:59:59.999Z`.
pub const MAX_TIMESTAMP_MILLIS: i64 = 253_402_300_799_999;

/// Latest instant [`format_timestamp`] renders in the fixed-width form.
/// Later years gain a sign prefix that neither parses back nor sorts.
pub fn max_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(MAX_TIMESTAMP_MILLIS).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Render a timestamp the way it is stored: UTC, millisecond precision,
/// `Z` suffix. Fixed width, so stored values order lexicographically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp; `column` is reported on failure.
pub fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Parse an optional stored timestamp.
pub fn parse_optional_timestamp(
    column: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_timestamp(column, &s)).transpose()
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub card_count: u64,
    pub book_count: u64,
    pub tree_node_count: u64,
    pub review_count: u64,
    pub integrity_ok: bool,
    pub integrity_details: String,
    /// Cards whose cached scheduling fields disagree with their review ledger.
    pub stale_cards: Vec<String>,
}

/// Run integrity and consistency checks over an open database.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let count = |table: &str| -> Result<u64> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(n as u64)
    };

    let integrity_details: String =
        conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;

    let stale_cards = crate::notes::reviews::stale_card_ids(conn)?;
    if !stale_cards.is_empty() {
        tracing::warn!(count = stale_cards.len(), "cards out of sync with review ledger");
    }

    Ok(HealthReport {
        schema_version: migrations::get_schema_version(conn)?,
        card_count: count("knowledge_cards")?,
        book_count: count("books")?,
        tree_node_count: count("tree_nodes")?,
        review_count: count("review_records")?,
        integrity_ok: integrity_details == "ok",
        integrity_details,
        stale_cards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn open_database_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cardnotes.db");

        let conn = open_database(&path).unwrap();
        assert!(path.exists());
        assert_eq!(
            migrations::get_schema_version(&conn).unwrap(),
            migrations::CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn timestamps_have_fixed_width() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2026-03-09T07:05:00.000Z");
    }

    #[test]
    fn timestamp_round_trips_at_millisecond_precision() {
        let ts = timestamp_now();
        let parsed = parse_timestamp(0, &format_timestamp(&ts)).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn max_timestamp_round_trips() {
        let max = max_timestamp();
        assert_eq!(format_timestamp(&max), "9999-12-31T23:59:59.999Z");
        assert_eq!(parse_timestamp(0, &format_timestamp(&max)).unwrap(), max);
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        let err = parse_timestamp(3, "yesterday").unwrap_err();
        assert!(matches!(err, rusqlite::Error::FromSqlConversionFailure(3, _, _)));
    }

    #[test]
    fn health_check_on_fresh_database() {
        let conn = open_memory_database().unwrap();
        let report = check_database_health(&conn).unwrap();
        assert!(report.integrity_ok);
        assert_eq!(report.book_count, 1); // seeded sample book
        assert_eq!(report.card_count, 0);
        assert!(report.stale_cards.is_empty());
    }
}
