use anyhow::Result;

use cardnotes::config::CardnotesConfig;
use cardnotes::notes::{reviews, stats};
use cardnotes::review::{Clock, SystemClock};

/// Display collection and review statistics in the terminal.
pub fn stats(config: &CardnotesConfig) -> Result<()> {
    let conn = super::open(config)?;
    let now = SystemClock.now();

    let collection = stats::collection_stats(&conn)?;
    let activity = stats::review_statistics(&conn, &now)?;

    println!("Collection");
    println!("{}", "=".repeat(40));
    println!("  Cards:               {}", collection.active_cards);
    println!("  Deleted cards:       {}", collection.deleted_cards);
    println!("  Books:               {}", collection.active_books);
    println!("  Deleted books:       {}", collection.deleted_books);
    println!("  Tree nodes:          {}", collection.tree_nodes);
    println!();

    println!("Reviews");
    println!("{}", "=".repeat(40));
    println!("  Total:               {}", activity.total_reviews);
    println!("  Average quality:     {:.2}", activity.average_quality);
    println!("  Reviewed today:      {}", activity.reviewed_today);
    println!("  Due tomorrow:        {}", activity.due_tomorrow);

    let recent = reviews::recent_reviews(&conn, config.review.recent_limit)?;
    if !recent.is_empty() {
        println!();
        println!("Recent:");
        for record in recent {
            println!(
                "  {}  q{}  {}",
                super::local(&record.reviewed_at),
                record.difficulty,
                record.card_id
            );
        }
    }

    Ok(())
}
