//! Review ledger queries.
//!
//! Rows are only ever inserted; a schema trigger rejects updates. History is
//! returned most-recent-first, with insertion order breaking ties between
//! records stamped in the same millisecond.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::ReviewRecord;
use crate::db::{format_timestamp, parse_timestamp};
use crate::error::Result;

pub(crate) const REVIEW_COLUMNS: &str =
    "id, card_id, difficulty, interval, ease_factor, next_review, reviewed_at";

pub(crate) fn review_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        id: row.get(0)?,
        card_id: row.get(1)?,
        difficulty: row.get(2)?,
        interval: row.get(3)?,
        ease_factor: row.get(4)?,
        next_review: parse_timestamp(5, &row.get::<_, String>(5)?)?,
        reviewed_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
    })
}

fn query_reviews(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<ReviewRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let reviews = stmt
        .query_map(params, review_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(reviews)
}

/// Append a record to the ledger.
pub fn append_review(conn: &Connection, review: &ReviewRecord) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO review_records ({REVIEW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            review.id,
            review.card_id,
            review.difficulty,
            review.interval,
            review.ease_factor,
            format_timestamp(&review.next_review),
            format_timestamp(&review.reviewed_at),
        ],
    )?;
    Ok(())
}

pub fn get_review(conn: &Connection, id: &str) -> Result<Option<ReviewRecord>> {
    let review = conn
        .query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM review_records WHERE id = ?1"),
            params![id],
            review_from_row,
        )
        .optional()?;
    Ok(review)
}

/// A card's ledger, most recent first.
pub fn reviews_by_card(conn: &Connection, card_id: &str) -> Result<Vec<ReviewRecord>> {
    query_reviews(
        conn,
        &format!(
            "SELECT {REVIEW_COLUMNS} FROM review_records WHERE card_id = ?1 \
             ORDER BY reviewed_at DESC, rowid DESC"
        ),
        params![card_id],
    )
}

pub fn count_reviews_by_card(conn: &Connection, card_id: &str) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM review_records WHERE card_id = ?1",
        params![card_id],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

/// Records reviewed within `[start, end]` (both inclusive), oldest first.
pub fn reviews_between(
    conn: &Connection,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<ReviewRecord>> {
    query_reviews(
        conn,
        &format!(
            "SELECT {REVIEW_COLUMNS} FROM review_records \
             WHERE reviewed_at >= ?1 AND reviewed_at <= ?2 \
             ORDER BY reviewed_at, rowid"
        ),
        params![format_timestamp(start), format_timestamp(end)],
    )
}

/// The `limit` most recent records across all cards.
pub fn recent_reviews(conn: &Connection, limit: usize) -> Result<Vec<ReviewRecord>> {
    query_reviews(
        conn,
        &format!(
            "SELECT {REVIEW_COLUMNS} FROM review_records \
             ORDER BY reviewed_at DESC, rowid DESC LIMIT ?1"
        ),
        params![limit as i64],
    )
}

/// Ids of cards whose cached scheduling fields disagree with their ledger:
/// the review count differs from the ledger length, or the cached interval,
/// ease factor, or due time differ from the latest record.
pub fn stale_card_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "WITH latest AS ( \
             SELECT card_id, interval, ease_factor, next_review, \
                    ROW_NUMBER() OVER (PARTITION BY card_id ORDER BY reviewed_at DESC, rowid DESC) AS rn, \
                    COUNT(*) OVER (PARTITION BY card_id) AS total \
             FROM review_records) \
         SELECT c.id FROM knowledge_cards c \
         LEFT JOIN latest l ON l.card_id = c.id AND l.rn = 1 \
         WHERE c.review_count != coalesce(l.total, 0) \
            OR (l.card_id IS NOT NULL AND ( \
                    c.interval IS NOT l.interval \
                 OR c.ease_factor IS NOT l.ease_factor \
                 OR c.next_review_at IS NOT l.next_review)) \
         ORDER BY c.created_at, c.rowid",
    )?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::notes::cards::create_card;
    use crate::notes::types::NewCard;
    use chrono::{Duration, TimeZone};

    fn card(conn: &Connection) -> String {
        create_card(
            conn,
            &NewCard {
                title: "Card".into(),
                content: "body".into(),
                difficulty: 3,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn record(id: &str, card_id: &str, reviewed_at: DateTime<Utc>) -> ReviewRecord {
        ReviewRecord {
            id: id.into(),
            card_id: card_id.into(),
            difficulty: 4,
            interval: 6,
            ease_factor: 2.5,
            next_review: reviewed_at + Duration::days(6),
            reviewed_at,
        }
    }

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, 9, 0, 0).unwrap()
    }

    #[test]
    fn history_is_most_recent_first_with_insertion_tiebreak() {
        let conn = open_memory_database().unwrap();
        let c = card(&conn);
        append_review(&conn, &record("r1", &c, t(1))).unwrap();
        append_review(&conn, &record("r2", &c, t(3))).unwrap();
        append_review(&conn, &record("r3", &c, t(3))).unwrap();

        let ids: Vec<String> = reviews_by_card(&conn, &c)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r3", "r2", "r1"]);
        assert_eq!(count_reviews_by_card(&conn, &c).unwrap(), 3);
    }

    #[test]
    fn get_review_round_trips() {
        let conn = open_memory_database().unwrap();
        let c = card(&conn);
        let r = record("r1", &c, t(2));
        append_review(&conn, &r).unwrap();
        assert_eq!(get_review(&conn, "r1").unwrap(), Some(r));
        assert!(get_review(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let conn = open_memory_database().unwrap();
        let c = card(&conn);
        append_review(&conn, &record("r1", &c, t(1))).unwrap();
        let err = append_review(&conn, &record("r1", &c, t(2))).unwrap_err();
        assert!(matches!(err, crate::Error::Storage(_)));
    }

    #[test]
    fn range_query_is_inclusive_on_both_ends() {
        let conn = open_memory_database().unwrap();
        let c = card(&conn);
        for (i, day) in [1, 2, 3, 4].into_iter().enumerate() {
            append_review(&conn, &record(&format!("r{i}"), &c, t(day))).unwrap();
        }

        let hits = reviews_between(&conn, &t(2), &t(3)).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].reviewed_at, t(2));
        assert_eq!(hits[1].reviewed_at, t(3));
    }

    #[test]
    fn recent_reviews_respects_limit() {
        let conn = open_memory_database().unwrap();
        let c = card(&conn);
        for day in 1..=5 {
            append_review(&conn, &record(&format!("r{day}"), &c, t(day))).unwrap();
        }
        let recent = recent_reviews(&conn, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "r5");
        assert_eq!(recent[1].id, "r4");
    }

    #[test]
    fn stale_cards_detects_ledger_without_card_update() {
        let conn = open_memory_database().unwrap();
        let c = card(&conn);
        let untouched = card(&conn);
        assert!(stale_card_ids(&conn).unwrap().is_empty());

        append_review(&conn, &record("r1", &c, t(1))).unwrap();
        assert_eq!(stale_card_ids(&conn).unwrap(), vec![c]);
        assert!(!stale_card_ids(&conn).unwrap().contains(&untouched));
    }
}
