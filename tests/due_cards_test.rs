mod helpers;

use cardnotes::notes::cards;
use cardnotes::review::Clock;
use chrono::{Duration, TimeZone, Utc};

fn schedule(conn: &rusqlite::Connection, id: &str, at: chrono::DateTime<Utc>) {
    let mut card = cards::require_card(conn, id).unwrap();
    card.next_review_at = Some(at);
    cards::put_card(conn, &card).unwrap();
}

#[test]
fn boundary_is_inclusive_to_the_millisecond() {
    let ledger = helpers::test_ledger();
    let conn = ledger.store().connection();
    let as_of = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();

    let exact = helpers::insert_card(conn, "Exactly due");
    let later = helpers::insert_card(conn, "One ms later");
    schedule(conn, &exact, as_of);
    schedule(conn, &later, as_of + Duration::milliseconds(1));

    let due: Vec<String> = ledger
        .due_cards(&as_of)
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(due, vec![exact]);
}

#[test]
fn unscheduled_cards_are_due_and_listed_first() {
    let ledger = helpers::test_ledger();
    let conn = ledger.store().connection();
    let now = ledger.clock().now();

    let overdue = helpers::insert_card(conn, "Overdue");
    schedule(conn, &overdue, now - Duration::days(3));
    let fresh = helpers::insert_card(conn, "Never reviewed");
    let future = helpers::insert_card(conn, "Not yet");
    schedule(conn, &future, now + Duration::days(2));

    let due: Vec<String> = ledger.due_now().unwrap().into_iter().map(|c| c.id).collect();
    assert_eq!(due, vec![fresh, overdue]);
}

#[test]
fn deleted_cards_never_appear() {
    let ledger = helpers::test_ledger();
    let conn = ledger.store().connection();
    let id = helpers::insert_card(conn, "Hidden");
    cards::soft_delete_card(conn, &id).unwrap();
    assert!(ledger.due_now().unwrap().is_empty());

    cards::restore_card(conn, &id).unwrap();
    assert_eq!(ledger.due_now().unwrap().len(), 1);
}

#[test]
fn no_duplicates_after_many_reviews() {
    let ledger = helpers::test_ledger();
    let conn = ledger.store().connection();
    let a = helpers::insert_card(conn, "A");
    let b = helpers::insert_card(conn, "B");
    for _ in 0..4 {
        ledger.record_review(&a, 2).unwrap();
        ledger.record_review(&b, 2).unwrap();
    }

    // Both failed, so both are due in one day.
    let tomorrow = ledger.clock().now() + Duration::days(2);
    let mut due: Vec<String> = ledger
        .due_cards(&tomorrow)
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    due.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(due, expected);
}

#[test]
fn reviewed_card_returns_exactly_at_its_next_review() {
    let ledger = helpers::test_ledger();
    let conn = ledger.store().connection();
    let id = helpers::insert_card(conn, "Cycle");
    ledger.record_review(&id, 4).unwrap();

    let next = cards::require_card(conn, &id).unwrap().next_review_at.unwrap();
    ledger.clock().set(next - Duration::milliseconds(1));
    assert!(ledger.due_now().unwrap().is_empty());
    ledger.clock().set(next);
    assert_eq!(ledger.due_now().unwrap().len(), 1);
}
