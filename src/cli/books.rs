//! CLI `book` commands.

use anyhow::Result;
use clap::Subcommand;

use cardnotes::config::CardnotesConfig;
use cardnotes::notes::{books, NewBook};

#[derive(Subcommand)]
pub enum BookAction {
    /// Create a book
    Add {
        title: String,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List books
    List,
}

pub fn run(config: &CardnotesConfig, action: BookAction) -> Result<()> {
    let conn = super::open(config)?;

    match action {
        BookAction::Add {
            title,
            author,
            description,
        } => {
            let id = books::create_book(
                &conn,
                &NewBook {
                    title,
                    author,
                    description,
                    cover_image: None,
                },
            )?;
            println!("{id}");
        }
        BookAction::List => {
            let list = books::list_books(&conn)?;
            if list.is_empty() {
                println!("No books.");
            }
            for book in list {
                let author = if book.author.is_empty() {
                    String::new()
                } else {
                    format!(" by {}", book.author)
                };
                println!("{}  {}{}", book.id, super::truncate(&book.title, 50), author);
            }
        }
    }

    Ok(())
}
