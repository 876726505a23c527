//! CLI `reset` command: delete all data after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use cardnotes::config::CardnotesConfig;

pub fn reset(config: &CardnotesConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL cards, books, tree layouts, and reviews.");
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let conn = super::open(config)?;

    // Children first for FK constraints
    conn.execute_batch(
        "BEGIN;
         DELETE FROM review_records;
         DELETE FROM tree_nodes;
         DELETE FROM knowledge_cards;
         DELETE FROM books;
         COMMIT;",
    )?;

    println!("All data deleted. Database reset complete.");
    Ok(())
}
