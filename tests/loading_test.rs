use std::time::Instant;

use signboard::notification::NotificationLevel;
use signboard::playback::{Locator, PlayerConfig, PlayerEvent, SurfaceContent};
use signboard::test_utils::fakes::*;

fn loc(s: &str) -> Option<Locator> {
    Locator::parse(s)
}

fn notices(events: &[PlayerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::Notice { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

fn loaded(events: &[PlayerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::Loaded(locator) => Some(locator.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_load_shows_first_page() {
    let mut rig = TestRigBuilder::new()
        .document("menu.pdf", fake_document(4, 100, 100))
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("menu.pdf"), now);
    assert!(rig.player.state().is_loading);
    assert!(settle(&mut rig.player, now));

    let state = rig.player.state();
    assert!(!state.is_loading);
    assert_eq!(state.total_pages, 4);
    assert_eq!(state.current_page, 1);
    assert_eq!(loaded(&rig.player.drain_events()), vec!["menu.pdf"]);
    assert_eq!(
        rig.player.surface().lock().content(),
        SurfaceContent::Page { page: 1 }
    );
}

#[test]
fn test_undecodable_document_clears_and_notifies() {
    let mut rig = TestRigBuilder::new()
        .document("broken.pdf", b"%PDF-garbage".to_vec())
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("broken.pdf"), now);
    assert!(settle(&mut rig.player, now));

    let events = rig.player.drain_events();
    let error = events.iter().find_map(|e| match e {
        PlayerEvent::Notice { level, message } => Some((*level, message.clone())),
        _ => None,
    });
    let (level, message) = error.expect("a load notice");
    assert_eq!(level, NotificationLevel::Error);
    assert!(message.starts_with("Could not load document"));

    let state = rig.player.state();
    assert_eq!(state.locator, None);
    assert_eq!(state.total_pages, 0);
    assert!(!state.is_loading);
    assert!(!rig.player.has_document());
    assert_eq!(rig.player.surface().lock().content(), SurfaceContent::Blank);
}

#[test]
fn test_network_failure_retries_last_good_silently() {
    let config = PlayerConfig {
        last_good: loc("menu.pdf"),
        ..PlayerConfig::default()
    };
    let mut rig = TestRigBuilder::new()
        .config(config)
        .document("menu.pdf", fake_document(3, 100, 100))
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("https://cdn.example/offline.pdf"), now);
    assert!(settle(&mut rig.player, now));

    let events = rig.player.drain_events();
    assert!(notices(&events).is_empty());
    assert_eq!(loaded(&events), vec!["menu.pdf"]);
    assert_eq!(rig.player.state().locator, loc("menu.pdf"));
    assert_eq!(rig.player.state().total_pages, 3);
    // one failed fetch plus the retry
    assert_eq!(rig.fetcher.fetch_count(), 2);
}

#[test]
fn test_failed_retry_gives_up() {
    let config = PlayerConfig {
        last_good: loc("gone.pdf"),
        ..PlayerConfig::default()
    };
    let mut rig = TestRigBuilder::new().config(config).build();
    let now = Instant::now();

    rig.player.set_locator(loc("https://cdn.example/offline.pdf"), now);
    assert!(settle(&mut rig.player, now));

    let events = rig.player.drain_events();
    assert_eq!(notices(&events).len(), 1);
    assert!(loaded(&events).is_empty());
    assert_eq!(rig.player.state().locator, None);
    assert_eq!(rig.fetcher.fetch_count(), 2);
}

#[test]
fn test_network_failure_without_last_good_notifies() {
    let mut rig = TestRigBuilder::new().build();
    let now = Instant::now();

    rig.player.set_locator(loc("https://cdn.example/offline.pdf"), now);
    assert!(settle(&mut rig.player, now));

    assert_eq!(notices(&rig.player.drain_events()).len(), 1);
    assert_eq!(rig.fetcher.fetch_count(), 1);
}

#[test]
fn test_decode_failure_is_never_retried() {
    let config = PlayerConfig {
        last_good: loc("menu.pdf"),
        ..PlayerConfig::default()
    };
    let mut rig = TestRigBuilder::new()
        .config(config)
        .document("menu.pdf", fake_document(3, 100, 100))
        .document("broken.pdf", b"nonsense".to_vec())
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("broken.pdf"), now);
    assert!(settle(&mut rig.player, now));

    assert_eq!(notices(&rig.player.drain_events()).len(), 1);
    assert_eq!(rig.player.state().locator, None);
    assert_eq!(rig.fetcher.fetch_count(), 1);
}

#[test]
fn test_missing_local_file_is_never_retried() {
    let config = PlayerConfig {
        last_good: loc("menu.pdf"),
        ..PlayerConfig::default()
    };
    let mut rig = TestRigBuilder::new()
        .config(config)
        .document("menu.pdf", fake_document(3, 100, 100))
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("/srv/signage/deleted.pdf"), now);
    assert!(settle(&mut rig.player, now));

    let events = rig.player.drain_events();
    assert_eq!(notices(&events).len(), 1);
    assert!(loaded(&events).is_empty());
    assert_eq!(rig.player.state().locator, None);
    assert_eq!(rig.fetcher.fetch_count(), 1);
}

#[test]
fn test_new_locator_supersedes_pending_load() {
    let mut rig = TestRigBuilder::new()
        .document("a.pdf", fake_document(2, 100, 100))
        .document("b.pdf", fake_document(5, 100, 100))
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("a.pdf"), now);
    rig.player.set_locator(loc("b.pdf"), now);
    assert!(settle(&mut rig.player, now));

    assert_eq!(loaded(&rig.player.drain_events()), vec!["b.pdf"]);
    assert_eq!(rig.player.state().total_pages, 5);
}

#[test]
fn test_same_locator_is_not_reloaded() {
    let mut rig = TestRigBuilder::new()
        .document("menu.pdf", fake_document(2, 100, 100))
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("menu.pdf"), now);
    assert!(settle(&mut rig.player, now));
    rig.player.set_locator(loc("menu.pdf"), now);
    assert!(settle(&mut rig.player, now));

    assert_eq!(rig.fetcher.fetch_count(), 1);
}

#[test]
fn test_refresh_source_follows_active_document() {
    let mut rig = TestRigBuilder::new()
        .document("menu.pdf", fake_document(2, 100, 100))
        .active("menu.pdf")
        .build();
    let now = Instant::now();

    rig.player.refresh_source();
    assert!(settle(&mut rig.player, now));
    assert_eq!(rig.player.state().locator, loc("menu.pdf"));
    assert_eq!(rig.player.state().total_pages, 2);

    rig.documents.set(None);
    rig.player.refresh_source();
    assert!(settle(&mut rig.player, now));
    assert_eq!(rig.player.state().locator, None);
    assert!(!rig.player.has_document());
    assert_eq!(rig.player.surface().lock().content(), SurfaceContent::Blank);
}

#[test]
fn test_clearing_locator_closes_document() {
    let mut rig = TestRigBuilder::new()
        .document("menu.pdf", fake_document(2, 100, 100))
        .build();
    let now = Instant::now();

    rig.player.set_locator(loc("menu.pdf"), now);
    assert!(settle(&mut rig.player, now));
    rig.player.set_locator(None, now);

    assert!(!rig.player.has_document());
    assert_eq!(rig.player.state().total_pages, 0);
    assert_eq!(rig.player.surface().lock().content(), SurfaceContent::Blank);
}
