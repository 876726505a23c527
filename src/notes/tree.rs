//! Tree layout of cards within a book.
//!
//! Nodes form a forest per book through `parent_id`. Subtree deletion walks the
//! tree with an explicit stack, so depth is bounded by memory rather than the
//! call stack.

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::types::{NewTreeNode, Position, TreeNode};
use super::validation::{self, validate_new_tree_node};
use crate::db::{format_timestamp, parse_timestamp, timestamp_now};
use crate::error::{Error, RecordKind, Result};

pub(crate) const NODE_COLUMNS: &str =
    "id, card_id, book_id, parent_id, position_x, position_y, created_at, updated_at";

pub(crate) fn node_from_row(row: &Row<'_>) -> rusqlite::Result<TreeNode> {
    Ok(TreeNode {
        id: row.get(0)?,
        card_id: row.get(1)?,
        book_id: row.get(2)?,
        parent_id: row.get(3)?,
        position: Position {
            x: row.get(4)?,
            y: row.get(5)?,
        },
        created_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
    })
}

fn query_nodes(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<TreeNode>> {
    let mut stmt = conn.prepare(sql)?;
    let nodes = stmt
        .query_map(params, node_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(nodes)
}

pub(crate) fn insert_node(conn: &Connection, node: &TreeNode) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO tree_nodes ({NODE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            node.id,
            node.card_id,
            node.book_id,
            node.parent_id,
            node.position.x,
            node.position.y,
            format_timestamp(&node.created_at),
            format_timestamp(&node.updated_at),
        ],
    )?;
    Ok(())
}

/// Place a card in a book's tree. The card, book, and parent (if any) must exist.
pub fn create_tree_node(conn: &Connection, new: &NewTreeNode) -> Result<String> {
    validate_new_tree_node(new)?;

    super::cards::require_card(conn, &new.card_id)?;
    super::books::require_book(conn, &new.book_id)?;
    if let Some(parent) = &new.parent_id {
        require_tree_node(conn, parent)?;
    }

    let now = timestamp_now();
    let node = TreeNode {
        id: uuid::Uuid::now_v7().to_string(),
        card_id: new.card_id.clone(),
        book_id: new.book_id.clone(),
        parent_id: new.parent_id.clone(),
        position: new.position,
        created_at: now,
        updated_at: now,
    };
    insert_node(conn, &node)?;
    Ok(node.id)
}

pub fn get_tree_node(conn: &Connection, id: &str) -> Result<Option<TreeNode>> {
    let node = conn
        .query_row(
            &format!("SELECT {NODE_COLUMNS} FROM tree_nodes WHERE id = ?1"),
            params![id],
            node_from_row,
        )
        .optional()?;
    Ok(node)
}

pub fn require_tree_node(conn: &Connection, id: &str) -> Result<TreeNode> {
    get_tree_node(conn, id)?.ok_or_else(|| Error::not_found(RecordKind::TreeNode, id))
}

pub fn nodes_by_book(conn: &Connection, book_id: &str) -> Result<Vec<TreeNode>> {
    query_nodes(
        conn,
        &format!("SELECT {NODE_COLUMNS} FROM tree_nodes WHERE book_id = ?1 ORDER BY created_at, rowid"),
        params![book_id],
    )
}

pub fn nodes_by_card(conn: &Connection, card_id: &str) -> Result<Vec<TreeNode>> {
    query_nodes(
        conn,
        &format!("SELECT {NODE_COLUMNS} FROM tree_nodes WHERE card_id = ?1 ORDER BY created_at, rowid"),
        params![card_id],
    )
}

pub fn child_nodes(conn: &Connection, parent_id: &str) -> Result<Vec<TreeNode>> {
    query_nodes(
        conn,
        &format!("SELECT {NODE_COLUMNS} FROM tree_nodes WHERE parent_id = ?1 ORDER BY created_at, rowid"),
        params![parent_id],
    )
}

fn child_ids(conn: &Connection, parent_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM tree_nodes WHERE parent_id = ?1")?;
    let ids = stmt
        .query_map(params![parent_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// Whether `candidate` is `node_id` itself or one of its descendants.
fn is_in_subtree(conn: &Connection, node_id: &str, candidate: &str) -> Result<bool> {
    let mut current = Some(candidate.to_string());
    let mut seen = HashSet::new();
    while let Some(id) = current {
        if id == node_id {
            return Ok(true);
        }
        if !seen.insert(id.clone()) {
            break;
        }
        current = conn
            .query_row(
                "SELECT parent_id FROM tree_nodes WHERE id = ?1",
                params![id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
    }
    Ok(false)
}

/// Reparent and/or reposition a node.
///
/// `new_parent`: `None` keeps the current parent, `Some(None)` makes the node a
/// root, `Some(Some(id))` moves it under `id`.
pub fn move_tree_node(
    conn: &Connection,
    id: &str,
    new_parent: Option<Option<&str>>,
    new_position: Option<Position>,
) -> Result<TreeNode> {
    let mut node = require_tree_node(conn, id)?;

    if new_parent.is_none() && new_position.is_none() {
        return Ok(node);
    }

    if let Some(position) = new_position {
        validation::validate_with(|errors| validation::check_position(errors, position.x, position.y))?;
        node.position = position;
    }

    if let Some(parent) = new_parent {
        if let Some(parent_id) = parent {
            require_tree_node(conn, parent_id)?;
            if is_in_subtree(conn, id, parent_id)? {
                return Err(Error::InvalidOperation(format!(
                    "cannot move tree node {id} beneath itself or its descendant {parent_id}"
                )));
            }
        }
        node.parent_id = parent.map(str::to_string);
    }

    node.updated_at = timestamp_now();
    conn.execute(
        "UPDATE tree_nodes SET parent_id = ?1, position_x = ?2, position_y = ?3, updated_at = ?4 \
         WHERE id = ?5",
        params![
            node.parent_id,
            node.position.x,
            node.position.y,
            format_timestamp(&node.updated_at),
            node.id,
        ],
    )?;
    Ok(node)
}

/// Delete a single node. Its children become roots.
pub fn delete_tree_node(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM tree_nodes WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found(RecordKind::TreeNode, id));
    }
    Ok(())
}

/// Delete a node and all of its descendants in one transaction. Returns the
/// number of nodes removed.
pub fn delete_subtree(conn: &Connection, id: &str) -> Result<usize> {
    require_tree_node(conn, id)?;

    let tx = conn.unchecked_transaction()?;

    let mut stack = vec![id.to_string()];
    let mut visited = HashSet::new();
    let mut doomed = Vec::new();
    while let Some(node_id) = stack.pop() {
        if !visited.insert(node_id.clone()) {
            continue;
        }
        stack.extend(child_ids(&tx, &node_id)?);
        doomed.push(node_id);
    }

    for node_id in &doomed {
        tx.execute("DELETE FROM tree_nodes WHERE id = ?1", params![node_id])?;
    }
    tx.commit()?;

    tracing::debug!(root = id, removed = doomed.len(), "subtree deleted");
    Ok(doomed.len())
}
