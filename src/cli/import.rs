use anyhow::{Context, Result};
use std::path::Path;

use cardnotes::config::CardnotesConfig;
use cardnotes::notes::transfer;

/// Replace the database contents with a JSON export.
pub fn import(config: &CardnotesConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let data: transfer::ExportData =
        serde_json::from_str(&json).context("failed to parse import JSON")?;

    let conn = super::open(config)?;
    let summary = transfer::import_data(&conn, &data)?;

    println!("Import complete:");
    println!("  Cards:       {}", summary.knowledge_cards);
    println!("  Books:       {}", summary.books);
    println!("  Tree nodes:  {}", summary.tree_nodes);
    println!("  Reviews:     {}", summary.review_records);
    Ok(())
}
