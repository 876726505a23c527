mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cardnotes::config::CardnotesConfig;

#[derive(Parser)]
#[command(name = "cardnotes", version, about = "Course notes with spaced-repetition review")]
struct Cli {
    /// Config file (default: ~/.cardnotes/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage knowledge cards
    Card {
        #[command(subcommand)]
        action: cli::cards::CardAction,
    },
    /// Manage books
    Book {
        #[command(subcommand)]
        action: cli::books::BookAction,
    },
    /// Record a review of a card
    Review {
        card_id: String,
        /// Recall quality, 0 (blackout) to 5 (perfect)
        #[arg(value_parser = clap::value_parser!(i32).range(0..=5))]
        quality: i32,
    },
    /// Show what a review would schedule without recording it
    Preview {
        card_id: String,
        #[arg(value_parser = clap::value_parser!(i32).range(0..=5))]
        quality: i32,
    },
    /// List cards due for review
    Due {
        /// RFC 3339 instant to evaluate against (default: now)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Show a card's review history, most recent first
    History { card_id: String },
    /// Show collection and review statistics
    Stats,
    /// Export the whole dataset as JSON to stdout
    Export,
    /// Replace the whole dataset from a JSON export
    Import { file: PathBuf },
    /// Check database integrity and ledger consistency
    Doctor {
        /// Rebuild out-of-sync card scheduling fields from the ledger
        #[arg(long)]
        repair: bool,
    },
    /// Delete all data
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CardnotesConfig::load_from(path)?,
        None => CardnotesConfig::load()?,
    };

    // Log to stderr so stdout stays clean for JSON export.
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Card { action } => cli::cards::run(&config, action)?,
        Command::Book { action } => cli::books::run(&config, action)?,
        Command::Review { card_id, quality } => cli::review::review(&config, &card_id, quality)?,
        Command::Preview { card_id, quality } => cli::review::preview(&config, &card_id, quality)?,
        Command::Due { as_of } => cli::review::due(&config, as_of.as_deref())?,
        Command::History { card_id } => cli::review::history(&config, &card_id)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Export => cli::export::export(&config)?,
        Command::Import { file } => cli::import::import(&config, &file)?,
        Command::Doctor { repair } => cli::doctor::doctor(&config, repair)?,
        Command::Reset => cli::reset::reset(&config)?,
    }

    Ok(())
}
