//! Spaced-repetition core: the SM-2 scheduler and the review ledger that
//! applies it to stored cards.

pub mod clock;
pub mod ledger;
pub mod scheduler;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::ReviewLedger;
pub use scheduler::{compute_next_state, ScheduleState, Scheduler};
pub use store::{ReviewStore, SqliteStore};
