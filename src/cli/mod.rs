pub mod books;
pub mod cards;
pub mod doctor;
pub mod export;
pub mod import;
pub mod reset;
pub mod review;
pub mod stats;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use rusqlite::Connection;

use cardnotes::config::CardnotesConfig;

/// Open the configured database.
pub fn open(config: &CardnotesConfig) -> Result<Connection> {
    let db_path = config.resolved_db_path();
    cardnotes::db::open_database(&db_path)
}

/// Parse an RFC 3339 instant from the command line.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid RFC 3339 timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Render an instant in local time for terminal output.
pub fn local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
