//! CLI review commands: `review`, `preview`, `due`, `history`.

use anyhow::Result;

use cardnotes::config::CardnotesConfig;
use cardnotes::review::{Clock, ReviewLedger, SqliteStore, SystemClock};

fn ledger(config: &CardnotesConfig) -> Result<ReviewLedger<SqliteStore, SystemClock>> {
    let conn = super::open(config)?;
    Ok(ReviewLedger::new(SqliteStore::new(conn), SystemClock))
}

pub fn review(config: &CardnotesConfig, card_id: &str, quality: i32) -> Result<()> {
    let ledger = ledger(config)?;
    let review_id = ledger.record_review(card_id, quality)?;

    let history = ledger.review_history(card_id)?;
    if let Some(record) = history.iter().find(|r| r.id == review_id) {
        println!("Recorded review {review_id}");
        println!("  Interval:      {} day(s)", record.interval);
        println!("  Ease factor:   {:.2}", record.ease_factor);
        println!("  Next review:   {}", super::local(&record.next_review));
    }
    Ok(())
}

pub fn preview(config: &CardnotesConfig, card_id: &str, quality: i32) -> Result<()> {
    let ledger = ledger(config)?;
    let state = ledger.preview(card_id, quality)?;

    println!("If rated {quality} now:");
    println!("  Interval:      {} day(s)", state.interval);
    println!("  Ease factor:   {:.2}", state.ease_factor);
    println!("  Next review:   {}", super::local(&state.next_review));
    Ok(())
}

pub fn due(config: &CardnotesConfig, as_of: Option<&str>) -> Result<()> {
    let ledger = ledger(config)?;
    let as_of = match as_of {
        Some(raw) => super::parse_instant(raw)?,
        None => ledger.clock().now(),
    };

    let mut cards = ledger.due_cards(&as_of)?;
    let total = cards.len();
    if config.review.due_limit > 0 {
        cards.truncate(config.review.due_limit);
    }

    super::cards::print_cards(&cards);
    if cards.len() < total {
        println!("... and {} more", total - cards.len());
    }
    Ok(())
}

pub fn history(config: &CardnotesConfig, card_id: &str) -> Result<()> {
    let ledger = ledger(config)?;
    let history = ledger.review_history(card_id)?;

    if history.is_empty() {
        println!("No reviews yet.");
        return Ok(());
    }

    println!("{:<17}  {:>7}  {:>8}  {:>5}  {}", "Reviewed", "Quality", "Interval", "Ease", "Next");
    for record in &history {
        println!(
            "{:<17}  {:>7}  {:>8}  {:>5.2}  {}",
            super::local(&record.reviewed_at),
            record.difficulty,
            record.interval,
            record.ease_factor,
            super::local(&record.next_review),
        );
    }
    Ok(())
}
