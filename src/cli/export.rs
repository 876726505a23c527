use anyhow::Result;

use cardnotes::config::CardnotesConfig;
use cardnotes::notes::transfer;

/// Export the whole dataset as JSON to stdout.
pub fn export(config: &CardnotesConfig) -> Result<()> {
    let conn = super::open(config)?;
    let data = transfer::export_data(&conn)?;

    println!("{}", serde_json::to_string_pretty(&data)?);

    eprintln!(
        "Exported {} cards, {} books, {} tree nodes, and {} reviews.",
        data.knowledge_cards.len(),
        data.books.len(),
        data.tree_nodes.len(),
        data.review_records.len()
    );
    Ok(())
}
