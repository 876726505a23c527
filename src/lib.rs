//! Local course-notes store with SM-2 spaced-repetition review.
//!
//! Knowledge cards are short notes that can be filed under books and laid out
//! as trees. Each card carries a scheduling state that the review core
//! advances with the SM-2 algorithm every time the card is reviewed:
//!
//! | Quality | Effect |
//! |---------|--------|
//! | **0-2** | Failed recall: interval resets to 1 day, ease factor drops |
//! | **3-5** | Successful recall: 1 day → 6 days → previous interval × ease factor |
//!
//! Every review is appended to an immutable ledger; the card keeps a cached
//! copy of the latest outcome so the due queue is a single indexed query.
//!
//! # Architecture
//!
//! - **Storage**: SQLite (bundled) in WAL mode, one file under `~/.cardnotes/`
//! - **Ledger**: `review_records` is append-only, enforced by a trigger
//! - **Time**: injected through [`review::Clock`] so scheduling is reproducible
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files and environment variables
//! - [`db`] - SQLite initialization, schema, migrations, timestamps, and health checks
//! - [`error`] - Library error type
//! - [`notes`] - Cards, books, card trees, ledger queries, statistics, and transfer
//! - [`review`] - SM-2 scheduler and the review ledger coordinator

pub mod config;
pub mod db;
pub mod error;
pub mod notes;
pub mod review;

pub use error::{Error, Result};
