//! Book storage.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{Book, BookUpdate, NewBook};
use super::validation::{self, validate_new_book};
use crate::db::{format_timestamp, parse_timestamp, timestamp_now};
use crate::error::{Error, RecordKind, Result};

pub(crate) const BOOK_COLUMNS: &str =
    "id, title, author, description, cover_image, is_deleted, created_at, updated_at";

pub(crate) fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        cover_image: row.get(4)?,
        is_deleted: row.get(5)?,
        created_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
    })
}

fn query_books(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare(sql)?;
    let books = stmt
        .query_map(params, book_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(books)
}

pub(crate) fn insert_book(conn: &Connection, book: &Book) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO books ({BOOK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            book.id,
            book.title,
            book.author,
            book.description,
            book.cover_image,
            book.is_deleted,
            format_timestamp(&book.created_at),
            format_timestamp(&book.updated_at),
        ],
    )?;
    Ok(())
}

pub fn create_book(conn: &Connection, new: &NewBook) -> Result<String> {
    validate_new_book(new)?;

    let now = timestamp_now();
    let book = Book {
        id: uuid::Uuid::now_v7().to_string(),
        title: new.title.clone(),
        author: new.author.clone(),
        description: new.description.clone(),
        cover_image: new.cover_image.clone(),
        is_deleted: false,
        created_at: now,
        updated_at: now,
    };
    insert_book(conn, &book)?;
    Ok(book.id)
}

/// Fetch a book by id, including soft-deleted books.
pub fn get_book(conn: &Connection, id: &str) -> Result<Option<Book>> {
    let book = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
            params![id],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

pub fn require_book(conn: &Connection, id: &str) -> Result<Book> {
    get_book(conn, id)?.ok_or_else(|| Error::not_found(RecordKind::Book, id))
}

pub fn list_books(conn: &Connection) -> Result<Vec<Book>> {
    query_books(
        conn,
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE is_deleted = 0 ORDER BY created_at, rowid"),
        [],
    )
}

pub fn update_book(conn: &Connection, id: &str, update: &BookUpdate) -> Result<Book> {
    let mut book = require_book(conn, id)?;

    validation::validate_with(|errors| {
        if let Some(title) = &update.title {
            validation::check_title(errors, title);
        }
        if let Some(author) = &update.author {
            validation::check_author(errors, author);
        }
        if let Some(description) = &update.description {
            validation::check_description(errors, description.as_deref());
        }
    })?;

    if let Some(title) = &update.title {
        book.title = title.clone();
    }
    if let Some(author) = &update.author {
        book.author = author.clone();
    }
    if let Some(description) = &update.description {
        book.description = description.clone();
    }
    if let Some(cover_image) = &update.cover_image {
        book.cover_image = cover_image.clone();
    }
    book.updated_at = timestamp_now();

    conn.execute(
        "UPDATE books SET title = ?1, author = ?2, description = ?3, cover_image = ?4, \
         updated_at = ?5 WHERE id = ?6",
        params![
            book.title,
            book.author,
            book.description,
            book.cover_image,
            format_timestamp(&book.updated_at),
            book.id,
        ],
    )?;
    Ok(book)
}

fn set_deleted(conn: &Connection, id: &str, deleted: bool) -> Result<()> {
    let rows = conn.execute(
        "UPDATE books SET is_deleted = ?1, updated_at = ?2 WHERE id = ?3",
        params![deleted, format_timestamp(&timestamp_now()), id],
    )?;
    if rows == 0 {
        return Err(Error::not_found(RecordKind::Book, id));
    }
    Ok(())
}

pub fn soft_delete_book(conn: &Connection, id: &str) -> Result<()> {
    set_deleted(conn, id, true)
}

pub fn restore_book(conn: &Connection, id: &str) -> Result<()> {
    set_deleted(conn, id, false)
}

/// Permanently remove a book and its tree layout. Cards tagged with the book
/// are left in place.
pub fn purge_book(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found(RecordKind::Book, id));
    }
    tracing::info!(id, "book permanently deleted");
    Ok(())
}

/// Case-insensitive substring search over title, author, and description.
pub fn search_books(conn: &Connection, query: &str) -> Result<Vec<Book>> {
    query_books(
        conn,
        &format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE is_deleted = 0 AND ( \
                 instr(lower(title), lower(?1)) > 0 \
                 OR instr(lower(author), lower(?1)) > 0 \
                 OR instr(lower(coalesce(description, '')), lower(?1)) > 0) \
             ORDER BY created_at, rowid"
        ),
        params![query],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::SAMPLE_BOOK_ID;
    use crate::db::open_memory_database;

    fn new_book(title: &str, author: &str) -> NewBook {
        NewBook {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    #[test]
    fn create_and_get() {
        let conn = open_memory_database().unwrap();
        let id = create_book(&conn, &new_book("Test Book", "Test Author")).unwrap();

        let book = require_book(&conn, &id).unwrap();
        assert_eq!(book.title, "Test Book");
        assert_eq!(book.author, "Test Author");
        assert!(!book.is_deleted);
    }

    #[test]
    fn list_includes_seeded_sample() {
        let conn = open_memory_database().unwrap();
        let books = list_books(&conn).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, SAMPLE_BOOK_ID);
    }

    #[test]
    fn search_matches_title_and_author() {
        let conn = open_memory_database().unwrap();
        create_book(&conn, &new_book("JavaScript Guide", "Someone")).unwrap();
        create_book(&conn, &new_book("Python Guide", "Someone Else")).unwrap();

        let results = search_books(&conn, "javascript").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "JavaScript Guide");

        assert_eq!(search_books(&conn, "ELSE").unwrap().len(), 1);
    }

    #[test]
    fn update_and_clear_description() {
        let conn = open_memory_database().unwrap();
        let id = create_book(
            &conn,
            &NewBook {
                description: Some("draft".into()),
                ..new_book("T", "A")
            },
        )
        .unwrap();

        let book = update_book(
            &conn,
            &id,
            &BookUpdate {
                author: Some("B".into()),
                description: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(book.author, "B");
        assert!(book.description.is_none());
        assert_eq!(require_book(&conn, &id).unwrap(), book);
    }

    #[test]
    fn soft_delete_restore_and_purge() {
        let conn = open_memory_database().unwrap();
        let id = create_book(&conn, &new_book("Temp", "A")).unwrap();

        soft_delete_book(&conn, &id).unwrap();
        assert!(list_books(&conn).unwrap().iter().all(|b| b.id != id));

        restore_book(&conn, &id).unwrap();
        assert!(list_books(&conn).unwrap().iter().any(|b| b.id == id));

        purge_book(&conn, &id).unwrap();
        assert!(get_book(&conn, &id).unwrap().is_none());
        assert!(soft_delete_book(&conn, &id).unwrap_err().is_not_found());
    }
}
