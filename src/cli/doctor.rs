//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use cardnotes::config::CardnotesConfig;
use cardnotes::db;
use cardnotes::review::{ReviewLedger, SqliteStore, SystemClock};

/// Run database diagnostics; with `repair`, rebuild stale cards from the ledger.
pub fn doctor(config: &CardnotesConfig, repair: bool) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run any `cardnotes` command to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("cardnotes Health Report");
    println!("=======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Row counts:");
    println!("  Cards:           {}", report.card_count);
    println!("  Books:           {}", report.book_count);
    println!("  Tree nodes:      {}", report.tree_node_count);
    println!("  Reviews:         {}", report.review_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    if report.stale_cards.is_empty() {
        println!("Ledger check:      PASSED");
    } else {
        println!(
            "Ledger check:      {} card(s) out of sync with their reviews",
            report.stale_cards.len()
        );
        if repair {
            let ledger = ReviewLedger::new(SqliteStore::new(conn), SystemClock);
            for id in &report.stale_cards {
                ledger.resync_card(id)?;
                println!("  repaired {id}");
            }
        } else {
            for id in &report.stale_cards {
                println!("  {id}");
            }
            println!("Run `cardnotes doctor --repair` to rebuild them from the ledger.");
        }
    }

    if !report.integrity_ok {
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.cardnotes/cardnotes.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     cardnotes export > backup.json");
        println!("     cardnotes reset && cardnotes import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
