//! SM-2 spaced-repetition scheduling.
//!
//! Given a recall quality on the 0-5 scale and a card's previous interval and
//! ease factor, produce the next interval (whole days), the new ease factor,
//! and the instant the card falls due again:
//!
//! - the ease factor moves by `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)` and is
//!   floored at 1.3 (no ceiling)
//! - a quality below 3 resets the interval to one day
//! - the first successful review after a one-day interval jumps to six days
//! - later successes multiply the previous interval by the new ease factor
//!
//! The scheduler is total: any integer quality produces a result. Range
//! checks belong to callers.

use chrono::{DateTime, Days, Local, TimeDelta, TimeZone, Utc};
use serde::Serialize;

use super::clock::Clock;
use crate::db::max_timestamp;

pub const DEFAULT_INTERVAL: u32 = 1;
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Interval after the first passing review that follows a one-day interval.
pub const GRADUATING_INTERVAL: u32 = 6;
/// Lowest quality that counts as successful recall.
pub const PASSING_QUALITY: i32 = 3;

/// Output of one scheduling step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleState {
    pub interval: u32,
    pub ease_factor: f64,
    pub next_review: DateTime<Utc>,
}

/// Ease factor after a review of the given quality, floored at [`MIN_EASE_FACTOR`].
pub fn next_ease_factor(quality: i32, previous_ease_factor: f64) -> f64 {
    let miss = 5.0 - f64::from(quality);
    let ease = previous_ease_factor + (0.1 - miss * (0.08 + miss * 0.02));
    if ease < MIN_EASE_FACTOR || ease.is_nan() {
        MIN_EASE_FACTOR
    } else {
        ease
    }
}

/// Interval in days after a review, given the already-updated ease factor.
pub fn next_interval(quality: i32, previous_interval: u32, ease_factor: f64) -> u32 {
    if quality < PASSING_QUALITY {
        DEFAULT_INTERVAL
    } else if previous_interval == 1 {
        GRADUATING_INTERVAL
    } else {
        // `as` saturates, so an overflowing product pins to u32::MAX.
        ((f64::from(previous_interval) * ease_factor).round() as u32).max(1)
    }
}

/// `now` plus `days` whole calendar days on the machine's local calendar.
pub fn add_calendar_days(now: &DateTime<Utc>, days: u32) -> DateTime<Utc> {
    add_calendar_days_in(now, days, &Local)
}

/// `now` plus `days` whole calendar days, keeping the wall-clock time of day
/// in `tz`.
///
/// When the shifted wall time does not exist or is ambiguous (a DST change),
/// falls back to adding `days * 24h`. Results saturate at [`max_timestamp`],
/// the latest instant storage can hold.
pub fn add_calendar_days_in<Tz: TimeZone>(now: &DateTime<Utc>, days: u32, tz: &Tz) -> DateTime<Utc> {
    let ceiling = max_timestamp();
    now.with_timezone(tz)
        .checked_add_days(Days::new(u64::from(days)))
        .map(|t| t.with_timezone(&Utc))
        .or_else(|| {
            TimeDelta::try_days(i64::from(days)).and_then(|delta| now.checked_add_signed(delta))
        })
        .map_or(ceiling, |t| t.min(ceiling))
}

fn effective_interval(previous_interval: u32) -> u32 {
    if previous_interval == 0 {
        DEFAULT_INTERVAL
    } else {
        previous_interval
    }
}

fn effective_ease_factor(previous_ease_factor: f64) -> f64 {
    if previous_ease_factor == 0.0 || previous_ease_factor.is_nan() {
        DEFAULT_EASE_FACTOR
    } else {
        previous_ease_factor
    }
}

/// One SM-2 step relative to an explicit `now`.
///
/// A zero interval, or an ease factor of zero or NaN, is read as unset and
/// replaced by the defaults. Negative ease factors are kept and end up at the
/// floor.
pub fn compute_next_state(
    quality: i32,
    previous_interval: u32,
    previous_ease_factor: f64,
    now: &DateTime<Utc>,
) -> ScheduleState {
    let previous_interval = effective_interval(previous_interval);
    let ease_factor = next_ease_factor(quality, effective_ease_factor(previous_ease_factor));
    let interval = next_interval(quality, previous_interval, ease_factor);
    let next_review = add_calendar_days(now, interval);

    tracing::debug!(quality, previous_interval, interval, ease_factor, "scheduled");
    ScheduleState {
        interval,
        ease_factor,
        next_review,
    }
}

/// SM-2 scheduler reading "now" from an injected clock.
#[derive(Debug, Clone)]
pub struct Scheduler<C> {
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn compute_next_state(
        &self,
        quality: i32,
        previous_interval: u32,
        previous_ease_factor: f64,
    ) -> ScheduleState {
        compute_next_state(quality, previous_interval, previous_ease_factor, &self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::clock::ManualClock;
    use chrono::{FixedOffset, TimeZone};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn perfect_first_review_graduates() {
        let state = compute_next_state(5, 1, 2.5, &at());
        assert_eq!(state.interval, 6);
        assert_eq!(state.ease_factor, 2.6);
    }

    #[test]
    fn total_failure_resets_without_clamping() {
        let state = compute_next_state(0, 10, 2.5, &at());
        assert_eq!(state.interval, 1);
        // 2.5 - 0.8 lands just above 1.7 in f64 and is above the floor.
        assert_eq!(state.ease_factor, 1.7000000000000002);
    }

    #[test]
    fn ease_factor_floor() {
        assert_eq!(next_ease_factor(0, 1.3), MIN_EASE_FACTOR);
        assert_eq!(next_ease_factor(-2, 2.5), MIN_EASE_FACTOR);
        assert_eq!(next_ease_factor(i32::MIN, 2.5), MIN_EASE_FACTOR);
        assert_eq!(next_ease_factor(i32::MAX, 2.5), MIN_EASE_FACTOR);
    }

    #[test]
    fn ease_factor_by_quality() {
        assert_eq!(next_ease_factor(4, 2.5), 2.5);
        assert_eq!(next_ease_factor(3, 2.5), 2.36);
        assert_eq!(next_ease_factor(-1, 2.5), 1.4);
    }

    #[test]
    fn failing_quality_always_resets_interval() {
        for quality in [-3, 0, 1, 2] {
            for previous in [1, 2, 6, 40, 365] {
                let state = compute_next_state(quality, previous, 2.8, &at());
                assert_eq!(state.interval, 1, "q={quality} prev={previous}");
            }
        }
    }

    #[test]
    fn passing_from_one_day_always_graduates_to_six() {
        for quality in [3, 4, 5, 9] {
            for ease in [1.3, 2.5, 3.7] {
                assert_eq!(compute_next_state(quality, 1, ease, &at()).interval, 6);
            }
        }
    }

    #[test]
    fn passing_later_multiplies_by_new_ease() {
        for (quality, previous, ease) in [(3, 6, 2.5), (4, 6, 2.5), (5, 6, 2.6), (5, 15, 1.3), (4, 100, 2.1)] {
            let state = compute_next_state(quality, previous, ease, &at());
            let expected = (f64::from(previous) * state.ease_factor).round() as u32;
            assert_eq!(state.interval, expected);
        }
        assert_eq!(compute_next_state(5, 6, 2.5, &at()).interval, 16);
    }

    #[test]
    fn half_day_products_round_away_from_zero() {
        // 5 * 2.5 = 12.5 exactly; quality 4 leaves the ease factor unchanged.
        assert_eq!(compute_next_state(4, 5, 2.5, &at()).interval, 13);
    }

    #[test]
    fn unset_inputs_fall_back_to_defaults() {
        assert_eq!(
            compute_next_state(5, 0, 0.0, &at()),
            compute_next_state(5, 1, 2.5, &at())
        );
        assert_eq!(compute_next_state(4, 6, f64::NAN, &at()).ease_factor, 2.5);
        assert_eq!(compute_next_state(5, 6, -1.0, &at()).ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn next_review_is_interval_calendar_days_later() {
        let now = at();
        for quality in 0..=5 {
            let state = compute_next_state(quality, 6, 2.5, &now);
            assert_eq!(state.next_review, add_calendar_days(&now, state.interval));
            assert!(state.next_review > now);
        }
    }

    #[test]
    fn calendar_days_keep_wall_time_in_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 27, 23, 0, 0).unwrap();
        assert_eq!(
            add_calendar_days_in(&now, 2, &tz),
            Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap()
        );
        assert_eq!(add_calendar_days_in(&now, 6, &Utc), now + TimeDelta::days(6));
    }

    #[test]
    fn huge_intervals_saturate_instead_of_panicking() {
        let state = compute_next_state(5, u32::MAX, 2.5, &at());
        assert_eq!(state.interval, u32::MAX);
        assert_eq!(state.next_review, max_timestamp());
    }

    #[test]
    fn due_dates_past_year_9999_are_capped() {
        let now = Utc.with_ymd_and_hms(9999, 12, 20, 0, 0, 0).unwrap();
        assert_eq!(add_calendar_days_in(&now, 30, &Utc), max_timestamp());
        assert_eq!(
            add_calendar_days_in(&now, 3, &Utc),
            Utc.with_ymd_and_hms(9999, 12, 23, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn scheduler_is_deterministic_under_frozen_clock() {
        let scheduler = Scheduler::new(ManualClock::new(at()));
        let first = scheduler.compute_next_state(4, 6, 2.5);
        let second = scheduler.compute_next_state(4, 6, 2.5);
        assert_eq!(first, second);
        assert_eq!(first.next_review, add_calendar_days(&at(), 15));
    }
}
