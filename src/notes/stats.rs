use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::format_timestamp;
use crate::error::Result;

/// Row counts for each collection.
#[derive(Debug, Serialize)]
pub struct CollectionStats {
    pub active_cards: u64,
    pub deleted_cards: u64,
    pub active_books: u64,
    pub deleted_books: u64,
    pub tree_nodes: u64,
    pub reviews: u64,
}

/// Review activity relative to a given instant.
#[derive(Debug, Serialize, PartialEq)]
pub struct ReviewStatistics {
    pub total_reviews: u64,
    /// Mean recall quality over the whole ledger, rounded to two decimals.
    pub average_quality: f64,
    /// Reviews made since local midnight today.
    pub reviewed_today: u64,
    /// Non-deleted cards that fall due during tomorrow (local calendar day).
    pub due_tomorrow: u64,
}

fn count(conn: &Connection, sql: &str) -> Result<u64> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as u64)
}

pub fn collection_stats(conn: &Connection) -> Result<CollectionStats> {
    Ok(CollectionStats {
        active_cards: count(conn, "SELECT COUNT(*) FROM knowledge_cards WHERE is_deleted = 0")?,
        deleted_cards: count(conn, "SELECT COUNT(*) FROM knowledge_cards WHERE is_deleted = 1")?,
        active_books: count(conn, "SELECT COUNT(*) FROM books WHERE is_deleted = 0")?,
        deleted_books: count(conn, "SELECT COUNT(*) FROM books WHERE is_deleted = 1")?,
        tree_nodes: count(conn, "SELECT COUNT(*) FROM tree_nodes")?,
        reviews: count(conn, "SELECT COUNT(*) FROM review_records")?,
    })
}

/// Start of the calendar day containing `now` in `tz`, shifted by `offset_days`.
pub fn day_start_in<Tz: TimeZone>(now: &DateTime<Utc>, offset_days: u64, tz: &Tz) -> DateTime<Utc> {
    let date = now.with_timezone(tz).date_naive();
    let date = date.checked_add_days(Days::new(offset_days)).unwrap_or(date);
    let midnight = date.and_time(NaiveTime::MIN);
    // A DST gap can skip midnight; fall back to reading the wall time as UTC.
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Review statistics using the machine's local calendar.
pub fn review_statistics(conn: &Connection, now: &DateTime<Utc>) -> Result<ReviewStatistics> {
    review_statistics_in(conn, now, &Local)
}

pub fn review_statistics_in<Tz: TimeZone>(
    conn: &Connection,
    now: &DateTime<Utc>,
    tz: &Tz,
) -> Result<ReviewStatistics> {
    let today = format_timestamp(&day_start_in(now, 0, tz));
    let tomorrow = format_timestamp(&day_start_in(now, 1, tz));
    let day_after = format_timestamp(&day_start_in(now, 2, tz));

    let (total, average): (i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), AVG(difficulty) FROM review_records",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let reviewed_today: i64 = conn.query_row(
        "SELECT COUNT(*) FROM review_records WHERE reviewed_at >= ?1 AND reviewed_at < ?2",
        params![today, tomorrow],
        |row| row.get(0),
    )?;

    let due_tomorrow: i64 = conn.query_row(
        "SELECT COUNT(*) FROM knowledge_cards \
         WHERE is_deleted = 0 AND next_review_at >= ?1 AND next_review_at < ?2",
        params![tomorrow, day_after],
        |row| row.get(0),
    )?;

    Ok(ReviewStatistics {
        total_reviews: total as u64,
        average_quality: average.map(|a| (a * 100.0).round() / 100.0).unwrap_or(0.0),
        reviewed_today: reviewed_today as u64,
        due_tomorrow: due_tomorrow as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::notes::cards::{create_card, put_card, require_card};
    use crate::notes::reviews::append_review;
    use crate::notes::types::{NewCard, ReviewRecord};
    use chrono::{Duration, FixedOffset};

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

    fn review(id: &str, card_id: &str, quality: i32, at: DateTime<Utc>) -> ReviewRecord {
        ReviewRecord {
            id: id.into(),
            card_id: card_id.into(),
            difficulty: quality,
            interval: 1,
            ease_factor: 2.5,
            next_review: at + Duration::days(1),
            reviewed_at: at,
        }
    }

    #[test]
    fn empty_ledger_has_zero_average() {
        let conn = open_memory_database().unwrap();
        let stats = review_statistics_in(&conn, &Utc::now(), &Utc).unwrap();
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.average_quality, 0.0);
    }

    #[test]
    fn day_start_respects_timezone() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 20, 0, 0).unwrap(); // 05:00 on May 2 in +09:00
        assert_eq!(
            day_start_in(&now, 0, &tz),
            Utc.with_ymd_and_hms(2026, 5, 1, 15, 0, 0).unwrap()
        );
        assert_eq!(
            day_start_in(&now, 1, &tz),
            Utc.with_ymd_and_hms(2026, 5, 2, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn statistics_count_today_and_tomorrow() {
        let conn = open_memory_database().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap();
        let a = card(&conn);
        let b = card(&conn);

        append_review(&conn, &review("r1", &a, 5, now - Duration::hours(2))).unwrap();
        append_review(&conn, &review("r2", &a, 2, now - Duration::days(1))).unwrap();
        append_review(&conn, &review("r3", &b, 4, now - Duration::minutes(5))).unwrap();

        let mut due = require_card(&conn, &b).unwrap();
        due.next_review_at = Some(Utc.with_ymd_and_hms(2026, 5, 11, 8, 0, 0).unwrap());
        put_card(&conn, &due).unwrap();

        let stats = review_statistics_in(&conn, &now, &Utc).unwrap();
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_quality, 3.67);
        assert_eq!(stats.reviewed_today, 2);
        assert_eq!(stats.due_tomorrow, 1);
    }

    #[test]
    fn collection_stats_split_deleted() {
        let conn = open_memory_database().unwrap();
        let a = card(&conn);
        card(&conn);
        crate::notes::cards::soft_delete_card(&conn, &a).unwrap();

        let stats = collection_stats(&conn).unwrap();
        assert_eq!(stats.active_cards, 1);
        assert_eq!(stats.deleted_cards, 1);
        assert_eq!(stats.active_books, 1);
        assert_eq!(stats.reviews, 0);
    }
}
