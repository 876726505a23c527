//! CLI `card` commands.

use anyhow::Result;
use clap::Subcommand;

use cardnotes::config::CardnotesConfig;
use cardnotes::notes::{cards, KnowledgeCard, NewCard};

#[derive(Subcommand)]
pub enum CardAction {
    /// Create a card
    Add {
        title: String,
        content: String,
        #[arg(long)]
        description: Option<String>,
        /// Tag (repeatable); use a book id to file the card under that book
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Card difficulty, 1-5
        #[arg(long, default_value_t = 3)]
        difficulty: u8,
    },
    /// List cards, optionally only those filed under a book
    List {
        #[arg(long)]
        book: Option<String>,
    },
    /// Show one card in full
    Show { id: String },
    /// Search title, description, content, and tags
    Search { query: String },
    /// Hide a card (soft delete), or remove it for good with --purge
    Delete {
        id: String,
        #[arg(long)]
        purge: bool,
    },
    /// Undo a soft delete
    Restore { id: String },
}

pub fn run(config: &CardnotesConfig, action: CardAction) -> Result<()> {
    let conn = super::open(config)?;

    match action {
        CardAction::Add {
            title,
            content,
            description,
            tags,
            difficulty,
        } => {
            let id = cards::create_card(
                &conn,
                &NewCard {
                    title,
                    description,
                    content,
                    tags,
                    difficulty,
                },
            )?;
            println!("{id}");
        }
        CardAction::List { book } => {
            let list = match book {
                Some(book_id) => cards::cards_by_book(&conn, &book_id)?,
                None => cards::list_cards(&conn)?,
            };
            print_cards(&list);
        }
        CardAction::Show { id } => {
            let card = cards::require_card(&conn, &id)?;
            print_card(&card);
        }
        CardAction::Search { query } => {
            print_cards(&cards::search_cards(&conn, &query)?);
        }
        CardAction::Delete { id, purge } => {
            if purge {
                cards::purge_card(&conn, &id)?;
                println!("Card {id} permanently deleted.");
            } else {
                cards::soft_delete_card(&conn, &id)?;
                println!("Card {id} deleted. Use `cardnotes card restore {id}` to undo.");
            }
        }
        CardAction::Restore { id } => {
            cards::restore_card(&conn, &id)?;
            println!("Card {id} restored.");
        }
    }

    Ok(())
}

pub fn print_cards(cards: &[KnowledgeCard]) {
    if cards.is_empty() {
        println!("No cards.");
        return;
    }
    for card in cards {
        let due = card
            .next_review_at
            .as_ref()
            .map(super::local)
            .unwrap_or_else(|| "new".to_string());
        println!("{}  {:<40}  due {}", card.id, super::truncate(&card.title, 40), due);
    }
}

fn print_card(card: &KnowledgeCard) {
    println!("{}", card.title);
    println!("{}", "=".repeat(card.title.chars().count().max(10)));
    println!("ID:            {}", card.id);
    if let Some(ref description) = card.description {
        println!("Description:   {description}");
    }
    if !card.tags.is_empty() {
        println!("Tags:          {}", card.tags.join(", "));
    }
    println!("Difficulty:    {}", card.difficulty);
    if card.is_deleted {
        println!("Status:        deleted");
    }
    println!();
    println!("{}", card.content);
    println!();
    println!("Reviews:       {}", card.review_count);
    if let Some(interval) = card.interval {
        println!("Interval:      {interval} day(s)");
    }
    if let Some(ease) = card.ease_factor {
        println!("Ease factor:   {ease:.2}");
    }
    if let Some(ref last) = card.last_reviewed_at {
        println!("Last reviewed: {}", super::local(last));
    }
    match card.next_review_at {
        Some(ref next) => println!("Next review:   {}", super::local(next)),
        None => println!("Next review:   now (never reviewed)"),
    }
}
