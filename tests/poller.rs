mod fixture;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fixture::{cancel_signal, Harness, ALICE, BOB};
use pretty_assertions::assert_eq;
use relay_chat::{
    ColorAssigner, MessageFeed, MessageRenderer, NameResolver, Poller, Watermark,
};

fn poller(harness: &Harness, room_id: &str, watermark: Watermark) -> (Poller, Arc<MessageFeed>) {
    let feed = Arc::new(MessageFeed::new(harness.store(), room_id));
    let names = Arc::new(NameResolver::new(harness.store()));
    let renderer = Arc::new(MessageRenderer::new(
        harness.output(),
        Arc::clone(&names),
        Arc::new(ColorAssigner::new()),
    ));
    let poller = Poller::new(
        Arc::clone(&feed),
        names,
        renderer,
        watermark,
        Duration::from_millis(20),
    );
    (poller, feed)
}

#[test]
fn watermark_tracks_the_last_rendered_message() {
    let harness = Harness::new();
    let room = harness.store.add_room("general");
    harness.store.add_profile(ALICE, Some("alice"));
    harness.store.add_profile(BOB, Some("bob"));
    let (mut poller, _) = poller(&harness, &room, Watermark::unset());

    harness.store.push_message(&room, ALICE, "first");
    let second = harness.store.push_message(&room, BOB, "second");
    assert_eq!(poller.poll_once(), Ok(2));
    assert_eq!(poller.watermark().get(), Some(second.as_str()));

    assert_eq!(poller.poll_once(), Ok(0));

    let third = harness.store.push_message(&room, ALICE, "third");
    assert_eq!(poller.poll_once(), Ok(1));
    assert_eq!(poller.watermark().get(), Some(third.as_str()));

    assert_eq!(
        harness.output.lines(),
        vec![
            "[09:00]  alice  first".to_string(),
            "[09:00]  bob  second".to_string(),
            "[09:00]  alice  third".to_string(),
        ]
    );
}

#[test]
fn fetches_use_the_watermark_as_exclusive_bound() {
    let harness = Harness::new();
    let room = harness.store.add_room("general");
    harness
        .store
        .push_message_at(&room, ALICE, "old", "2024-01-15T09:30:00Z");
    harness
        .store
        .push_message_at(&room, ALICE, "new", "2024-01-15T09:31:00Z");
    let (mut poller, _) = poller(&harness, &room, Watermark::at("2024-01-15T09:30:00Z"));

    assert_eq!(poller.poll_once(), Ok(1));

    let fetches = harness.store.message_fetches();
    assert_eq!(fetches[0].after.as_deref(), Some("2024-01-15T09:30:00Z"));
    assert_eq!(harness.output.lines(), vec!["[09:31]  User-a11ce000  new".to_string()]);
}

#[test]
fn schema_mismatch_falls_back_and_is_remembered() {
    let harness = Harness::new();
    let room = harness.store.add_room("general");
    harness.store.add_profile(ALICE, Some("alice"));
    harness.store.reject_profile_relation(true);
    let (mut poller, feed) = poller(&harness, &room, Watermark::unset());

    harness.store.push_message(&room, ALICE, "hello");
    assert_eq!(poller.poll_once(), Ok(1));
    assert!(!feed.embeds_profiles());
    assert_eq!(poller.poll_once(), Ok(0));

    let embed_flags: Vec<bool> = harness
        .store
        .message_fetches()
        .iter()
        .map(|query| query.include_profiles)
        .collect();
    assert_eq!(embed_flags, vec![true, false, false]);
    assert_eq!(harness.output.lines(), vec!["[09:00]  alice  hello".to_string()]);
    assert_eq!(harness.store.profile_batches().len(), 1);
}

#[test]
fn failed_cycle_keeps_the_watermark() {
    let harness = Harness::new();
    let room = harness.store.add_room("general");
    let created_at = harness.store.push_message(&room, ALICE, "hello");
    let (mut poller, _) = poller(&harness, &room, Watermark::unset());

    harness.store.fail_next_fetches(1);
    assert!(poller.poll_once().is_err());
    assert_eq!(poller.watermark(), &Watermark::unset());

    assert_eq!(poller.poll_once(), Ok(1));
    assert_eq!(poller.watermark().get(), Some(created_at.as_str()));
}

#[test]
fn run_survives_failures_and_stops_on_cancel() {
    let harness = Harness::new();
    let room = harness.store.add_room("general");
    harness.store.add_profile(ALICE, Some("alice"));
    harness.store.fail_next_fetches(2);
    let created_at = harness.store.push_message(&room, ALICE, "hello");
    let (poller, _) = poller(&harness, &room, Watermark::unset());

    let cancel = cancel_signal();
    let worker_cancel = Arc::clone(&cancel);
    let worker = thread::spawn(move || poller.run(&worker_cancel));

    assert!(fixture::wait_until(Duration::from_secs(5), || {
        harness.output.lines().len() == 1
    }));
    cancel.store(true, Ordering::Release);
    let stopped_at = Instant::now();
    let watermark = worker.join().unwrap();

    assert!(stopped_at.elapsed() < Duration::from_secs(1));
    assert_eq!(watermark.get(), Some(created_at.as_str()));
    assert_eq!(harness.output.lines(), vec!["[09:00]  alice  hello".to_string()]);
}
