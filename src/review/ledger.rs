//! Review ledger coordinator.
//!
//! Recording a review appends an immutable [`ReviewRecord`] and then refreshes
//! the scheduling cache on the card (`interval`, `ease_factor`,
//! `next_review_at`, `last_reviewed_at`, `review_count`). The ledger is the
//! source of truth. Both writes run inside [`ReviewStore::atomically`]; for a
//! store without transactions the append still comes first, so a failure
//! between the two leaves a record the card does not reflect yet, which
//! [`ReviewLedger::resync_card`] repairs.
//!
//! Concurrent `record_review` calls on the same card through a store without
//! transactions can race on the cached fields (last writer wins).

use chrono::{DateTime, Utc};

use super::clock::Clock;
use super::scheduler::{
    compute_next_state, ScheduleState, Scheduler, DEFAULT_EASE_FACTOR, DEFAULT_INTERVAL,
};
use super::store::ReviewStore;
use crate::error::{Error, RecordKind, Result};
use crate::notes::types::{KnowledgeCard, ReviewRecord};

pub struct ReviewLedger<S, C> {
    store: S,
    scheduler: Scheduler<C>,
}

impl<S: ReviewStore, C: Clock> ReviewLedger<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            scheduler: Scheduler::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    pub fn clock(&self) -> &C {
        self.scheduler.clock()
    }

    /// A card that exists and is not soft-deleted.
    fn live_card(store: &S, card_id: &str) -> Result<KnowledgeCard> {
        match store.get_card(card_id)? {
            Some(card) if !card.is_deleted => Ok(card),
            _ => Err(Error::not_found(RecordKind::Card, card_id)),
        }
    }

    /// Schedule relative to `now`, so the due date and the review timestamp
    /// come from the same clock reading.
    fn schedule(card: &KnowledgeCard, quality: i32, now: &DateTime<Utc>) -> ScheduleState {
        compute_next_state(
            quality,
            card.interval.unwrap_or(DEFAULT_INTERVAL),
            card.ease_factor.unwrap_or(DEFAULT_EASE_FACTOR),
            now,
        )
    }

    /// Record a review of `card_id` with the given recall quality and return
    /// the new record's id.
    ///
    /// Fails with [`Error::NotFound`] for unknown or soft-deleted cards, in
    /// which case nothing is written.
    pub fn record_review(&self, card_id: &str, quality: i32) -> Result<String> {
        let record = self.store.atomically(|store| {
            let mut card = Self::live_card(store, card_id)?;
            let now = self.clock().now();
            let next = Self::schedule(&card, quality, &now);

            let record = ReviewRecord {
                id: uuid::Uuid::now_v7().to_string(),
                card_id: card.id.clone(),
                difficulty: quality,
                interval: next.interval,
                ease_factor: next.ease_factor,
                next_review: next.next_review,
                reviewed_at: now,
            };
            store.append_review(&record)?;

            card.last_reviewed_at = Some(now);
            card.next_review_at = Some(next.next_review);
            card.review_count += 1;
            card.interval = Some(next.interval);
            card.ease_factor = Some(next.ease_factor);
            card.updated_at = now;
            store.put_card(&card)?;

            Ok(record)
        })?;

        tracing::info!(
            card_id,
            review_id = %record.id,
            quality,
            interval = record.interval,
            ease_factor = record.ease_factor,
            "review recorded"
        );
        Ok(record.id)
    }

    /// What [`record_review`](Self::record_review) would schedule, without
    /// writing anything.
    pub fn preview(&self, card_id: &str, quality: i32) -> Result<ScheduleState> {
        let card = Self::live_card(&self.store, card_id)?;
        Ok(Self::schedule(&card, quality, &self.clock().now()))
    }

    /// The review queue as of `as_of`: unscheduled cards and cards due at or
    /// before it (inclusive).
    pub fn due_cards(&self, as_of: &DateTime<Utc>) -> Result<Vec<KnowledgeCard>> {
        let cards = self.store.due_cards(as_of)?;
        tracing::debug!(as_of = %as_of, count = cards.len(), "due cards");
        Ok(cards)
    }

    pub fn due_now(&self) -> Result<Vec<KnowledgeCard>> {
        self.due_cards(&self.clock().now())
    }

    /// A card's reviews, most recent first. Soft-deleted cards keep their
    /// history.
    pub fn review_history(&self, card_id: &str) -> Result<Vec<ReviewRecord>> {
        if self.store.get_card(card_id)?.is_none() {
            return Err(Error::not_found(RecordKind::Card, card_id));
        }
        self.store.reviews_for_card(card_id)
    }

    /// Rebuild a card's cached scheduling fields from its ledger.
    ///
    /// Returns `true` if the card was changed. A card with no reviews keeps
    /// its interval and ease factor; only the count and timestamps reset.
    pub fn resync_card(&self, card_id: &str) -> Result<bool> {
        self.store.atomically(|store| {
            let mut card = store
                .get_card(card_id)?
                .ok_or_else(|| Error::not_found(RecordKind::Card, card_id))?;
            let history = store.reviews_for_card(card_id)?;
            let before = card.clone();

            card.review_count = u32::try_from(history.len()).unwrap_or(u32::MAX);
            match history.first() {
                Some(latest) => {
                    card.interval = Some(latest.interval);
                    card.ease_factor = Some(latest.ease_factor);
                    card.next_review_at = Some(latest.next_review);
                    card.last_reviewed_at = Some(latest.reviewed_at);
                }
                None => {
                    card.next_review_at = None;
                    card.last_reviewed_at = None;
                }
            }

            if card == before {
                return Ok(false);
            }
            card.updated_at = self.clock().now();
            store.put_card(&card)?;
            tracing::warn!(
                card_id,
                review_count = card.review_count,
                "card scheduling cache rebuilt from ledger"
            );
            Ok(true)
        })
    }
}
