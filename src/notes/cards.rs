//! Knowledge card storage: create, read, update, soft/hard delete, and search.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{CardUpdate, KnowledgeCard, NewCard};
use super::validation::{self, validate_new_card};
use crate::db::{format_timestamp, parse_optional_timestamp, parse_timestamp, timestamp_now};
use crate::error::{Error, RecordKind, Result};
use crate::review::scheduler::{DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL};

pub(crate) const CARD_COLUMNS: &str = "id, title, description, content, tags, difficulty, \
     review_count, last_reviewed_at, next_review_at, interval, ease_factor, is_deleted, \
     created_at, updated_at";

/// Map a row selected with [`CARD_COLUMNS`].
pub(crate) fn card_from_row(row: &Row<'_>) -> rusqlite::Result<KnowledgeCard> {
    let tags_json: String = row.get(4)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(KnowledgeCard {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        content: row.get(3)?,
        tags,
        difficulty: row.get(5)?,
        review_count: row.get(6)?,
        last_reviewed_at: parse_optional_timestamp(7, row.get(7)?)?,
        next_review_at: parse_optional_timestamp(8, row.get(8)?)?,
        interval: row.get(9)?,
        ease_factor: row.get(10)?,
        is_deleted: row.get(11)?,
        created_at: parse_timestamp(12, &row.get::<_, String>(12)?)?,
        updated_at: parse_timestamp(13, &row.get::<_, String>(13)?)?,
    })
}

fn query_cards(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<KnowledgeCard>> {
    let mut stmt = conn.prepare(sql)?;
    let cards = stmt
        .query_map(params, card_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

/// Insert a card, or overwrite every mutable column of an existing one.
///
/// Uses an upsert rather than `INSERT OR REPLACE` so the row is never deleted,
/// which would cascade to the card's ledger and tree nodes.
pub fn put_card(conn: &Connection, card: &KnowledgeCard) -> Result<()> {
    let tags = serde_json::to_string(&card.tags)?;
    conn.execute(
        &format!(
            "INSERT INTO knowledge_cards ({CARD_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
             ON CONFLICT(id) DO UPDATE SET \
                 title = excluded.title, \
                 description = excluded.description, \
                 content = excluded.content, \
                 tags = excluded.tags, \
                 difficulty = excluded.difficulty, \
                 review_count = excluded.review_count, \
                 last_reviewed_at = excluded.last_reviewed_at, \
                 next_review_at = excluded.next_review_at, \
                 interval = excluded.interval, \
                 ease_factor = excluded.ease_factor, \
                 is_deleted = excluded.is_deleted, \
                 updated_at = excluded.updated_at"
        ),
        params![
            card.id,
            card.title,
            card.description,
            card.content,
            tags,
            card.difficulty,
            card.review_count,
            card.last_reviewed_at.as_ref().map(format_timestamp),
            card.next_review_at.as_ref().map(format_timestamp),
            card.interval,
            card.ease_factor,
            card.is_deleted,
            format_timestamp(&card.created_at),
            format_timestamp(&card.updated_at),
        ],
    )?;
    Ok(())
}

/// Create a card with fresh scheduling defaults. Returns its id.
pub fn create_card(conn: &Connection, new: &NewCard) -> Result<String> {
    validate_new_card(new)?;

    let now = timestamp_now();
    let card = KnowledgeCard {
        id: uuid::Uuid::now_v7().to_string(),
        title: new.title.clone(),
        description: new.description.clone(),
        content: new.content.clone(),
        tags: new.tags.clone(),
        difficulty: new.difficulty,
        review_count: 0,
        last_reviewed_at: None,
        next_review_at: None,
        interval: Some(DEFAULT_INTERVAL),
        ease_factor: Some(DEFAULT_EASE_FACTOR),
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };
    put_card(conn, &card)?;

    tracing::debug!(id = %card.id, "card created");
    Ok(card.id)
}

/// Fetch a card by id, including soft-deleted cards.
pub fn get_card(conn: &Connection, id: &str) -> Result<Option<KnowledgeCard>> {
    let card = conn
        .query_row(
            &format!("SELECT {CARD_COLUMNS} FROM knowledge_cards WHERE id = ?1"),
            params![id],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

/// Fetch a card by id or fail with [`Error::NotFound`].
pub fn require_card(conn: &Connection, id: &str) -> Result<KnowledgeCard> {
    get_card(conn, id)?.ok_or_else(|| Error::not_found(RecordKind::Card, id))
}

/// All cards that are not soft-deleted, oldest first.
pub fn list_cards(conn: &Connection) -> Result<Vec<KnowledgeCard>> {
    query_cards(
        conn,
        &format!(
            "SELECT {CARD_COLUMNS} FROM knowledge_cards WHERE is_deleted = 0 \
             ORDER BY created_at, rowid"
        ),
        [],
    )
}

/// Cards filed under a book (tagged with the book's id).
pub fn cards_by_book(conn: &Connection, book_id: &str) -> Result<Vec<KnowledgeCard>> {
    query_cards(
        conn,
        &format!(
            "SELECT {CARD_COLUMNS} FROM knowledge_cards \
             WHERE is_deleted = 0 \
               AND EXISTS (SELECT 1 FROM json_each(knowledge_cards.tags) WHERE value = ?1) \
             ORDER BY created_at, rowid"
        ),
        params![book_id],
    )
}

/// Non-deleted cards that have never been scheduled or whose due time is at or
/// before `as_of`. Unscheduled cards come first, then by due time.
pub fn due_cards(conn: &Connection, as_of: &DateTime<Utc>) -> Result<Vec<KnowledgeCard>> {
    query_cards(
        conn,
        &format!(
            "SELECT {CARD_COLUMNS} FROM knowledge_cards \
             WHERE is_deleted = 0 AND (next_review_at IS NULL OR next_review_at <= ?1) \
             ORDER BY next_review_at IS NOT NULL, next_review_at, created_at, rowid"
        ),
        params![format_timestamp(as_of)],
    )
}

/// Apply a partial update to a card's content fields.
pub fn update_card(conn: &Connection, id: &str, update: &CardUpdate) -> Result<KnowledgeCard> {
    let mut card = require_card(conn, id)?;

    validation::validate_with(|errors| {
        if let Some(title) = &update.title {
            validation::check_title(errors, title);
        }
        if let Some(content) = &update.content {
            validation::check_content(errors, content);
        }
        if let Some(tags) = &update.tags {
            validation::check_tags(errors, tags);
        }
        if let Some(difficulty) = update.difficulty {
            validation::check_difficulty(errors, difficulty);
        }
        if let Some(description) = &update.description {
            validation::check_description(errors, description.as_deref());
        }
    })?;

    if let Some(title) = &update.title {
        card.title = title.clone();
    }
    if let Some(description) = &update.description {
        card.description = description.clone();
    }
    if let Some(content) = &update.content {
        card.content = content.clone();
    }
    if let Some(tags) = &update.tags {
        card.tags = tags.clone();
    }
    if let Some(difficulty) = update.difficulty {
        card.difficulty = difficulty;
    }
    card.updated_at = timestamp_now();

    put_card(conn, &card)?;
    Ok(card)
}

fn set_deleted(conn: &Connection, id: &str, deleted: bool) -> Result<()> {
    let rows = conn.execute(
        "UPDATE knowledge_cards SET is_deleted = ?1, updated_at = ?2 WHERE id = ?3",
        params![deleted, format_timestamp(&timestamp_now()), id],
    )?;
    if rows == 0 {
        return Err(Error::not_found(RecordKind::Card, id));
    }
    Ok(())
}

/// Soft delete: hide the card from listings and the review queue.
pub fn soft_delete_card(conn: &Connection, id: &str) -> Result<()> {
    set_deleted(conn, id, true)
}

pub fn restore_card(conn: &Connection, id: &str) -> Result<()> {
    set_deleted(conn, id, false)
}

/// Permanently remove a card. Its review ledger and tree nodes go with it.
pub fn purge_card(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM knowledge_cards WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found(RecordKind::Card, id));
    }
    tracing::info!(id, "card permanently deleted");
    Ok(())
}

/// Case-insensitive substring search over title, description, content, and tags.
pub fn search_cards(conn: &Connection, query: &str) -> Result<Vec<KnowledgeCard>> {
    query_cards(
        conn,
        &format!(
            "SELECT {CARD_COLUMNS} FROM knowledge_cards \
             WHERE is_deleted = 0 AND ( \
                 instr(lower(title), lower(?1)) > 0 \
                 OR instr(lower(coalesce(description, '')), lower(?1)) > 0 \
                 OR instr(lower(content), lower(?1)) > 0 \
                 OR EXISTS (SELECT 1 FROM json_each(knowledge_cards.tags) \
                            WHERE instr(lower(value), lower(?1)) > 0)) \
             ORDER BY created_at, rowid"
        ),
        params![query],
    )
}
