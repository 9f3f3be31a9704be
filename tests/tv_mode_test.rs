use std::time::{Duration, Instant};

use signboard::deck::AnnouncementSlide;
use signboard::playback::{Locator, PlayerEvent, TvPhase, ViewportBox};
use signboard::test_utils::fakes::*;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// Advance to `at`, firing timers and letting the workers finish
fn step(rig: &mut TestRig, at: Instant) {
    rig.player.tick(at);
    assert!(settle(&mut rig.player, at));
}

fn board_position(rig: &TestRig) -> Option<(String, usize, usize)> {
    match rig.player.phase() {
        TvPhase::Board(cursor) => cursor
            .current()
            .map(|slide| (slide.id.clone(), cursor.index, cursor.deck.len())),
        TvPhase::Document => None,
    }
}

fn tv_rig(pages: Option<usize>, deck: ScriptedDeck, t0: Instant) -> TestRig {
    let mut builder = TestRigBuilder::new().deck(deck);
    if let Some(pages) = pages {
        builder = builder.document("menu.pdf", fake_document(pages, 100, 100));
    }
    let mut rig = builder.build();
    if pages.is_some() {
        rig.player.set_locator(Locator::parse("menu.pdf"), t0);
    }
    rig.player.set_tv_mode(true, t0);
    assert!(settle(&mut rig.player, t0));
    rig.player.drain_events();
    rig
}

#[test]
fn test_tv_mode_toggles_emit_changes() {
    let t0 = Instant::now();
    let mut rig = TestRigBuilder::new().build();

    rig.player.set_tv_mode(true, t0);
    rig.player.set_tv_mode(true, t0);
    rig.player.toggle_tv_mode(t0);

    assert_eq!(
        rig.player.drain_events(),
        vec![
            PlayerEvent::TvModeChanged(true),
            PlayerEvent::TvModeChanged(false)
        ]
    );
}

#[test]
fn test_chrome_hides_after_idle_and_returns_on_activity() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(2), ScriptedDeck::default(), t0);

    rig.player.tick(t0 + secs(2));
    assert!(rig.player.state().ui_visible);
    rig.player.tick(t0 + secs(3));
    assert!(!rig.player.state().ui_visible);

    rig.player.note_activity(t0 + secs(4));
    assert!(rig.player.state().ui_visible);
    rig.player.tick(t0 + Duration::from_millis(6_900));
    assert!(rig.player.state().ui_visible);
    rig.player.tick(t0 + secs(7));
    assert!(!rig.player.state().ui_visible);

    rig.player.set_tv_mode(false, t0 + secs(8));
    assert!(rig.player.state().ui_visible);
}

#[test]
fn test_tv_mode_on_off_on_resumes_idle_hiding() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(2), ScriptedDeck::default(), t0);

    rig.player.tick(t0 + secs(3));
    assert!(!rig.player.state().ui_visible);

    rig.player.set_tv_mode(false, t0 + secs(4));
    assert!(rig.player.state().ui_visible);
    rig.player.tick(t0 + secs(20));
    assert!(rig.player.state().ui_visible);

    rig.player.set_tv_mode(true, t0 + secs(21));
    assert!(rig.player.state().ui_visible);
    rig.player.tick(t0 + secs(23));
    assert!(rig.player.state().ui_visible);
    rig.player.tick(t0 + secs(24));
    assert!(!rig.player.state().ui_visible);
}

#[test]
fn test_chrome_stays_while_pointer_rests_on_status_bar() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(2), ScriptedDeck::default(), t0);

    rig.player.pointer_moved(t0 + secs(1), true);
    rig.player.tick(t0 + secs(30));
    assert!(rig.player.state().ui_visible);

    rig.player.pointer_moved(t0 + secs(31), false);
    rig.player.tick(t0 + secs(33));
    assert!(rig.player.state().ui_visible);
    rig.player.tick(t0 + secs(34));
    assert!(!rig.player.state().ui_visible);
}

#[test]
fn test_activity_outside_tv_mode_is_ignored() {
    let t0 = Instant::now();
    let mut rig = TestRigBuilder::new().build();
    rig.player.note_activity(t0);
    rig.player.tick(t0 + secs(10));
    assert!(rig.player.state().ui_visible);
}

#[test]
fn test_fullscreen_requested_after_grace_period() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(1), ScriptedDeck::default(), t0);
    assert!(rig.player.is_fullscreen_pending());

    rig.player.tick(t0 + secs(2));
    assert_eq!(rig.player.viewport().fullscreen_requests, 0);
    rig.player.tick(t0 + secs(3));
    assert_eq!(rig.player.viewport().fullscreen_requests, 1);
    assert!(rig.player.viewport().fullscreen);

    rig.player.set_tv_mode(false, t0 + secs(4));
    assert!(!rig.player.viewport().fullscreen);
}

#[test]
fn test_entering_fullscreen_refits_the_page() {
    let t0 = Instant::now();
    let mut viewport = FakeViewport::new(400.0, 300.0);
    viewport.fullscreen_size = Some(ViewportBox::new(400.0, 450.0));
    let mut rig = TestRigBuilder::new()
        .viewport(viewport)
        .document("menu.pdf", fake_document(2, 100, 300))
        .build();
    rig.player.set_locator(Locator::parse("menu.pdf"), t0);
    rig.player.set_tv_mode(true, t0);
    assert!(settle(&mut rig.player, t0));
    assert!((rig.player.state().scale - 1.0).abs() < 1e-6);
    rig.player.drain_events();

    rig.player.tick(t0 + secs(3));
    assert!(rig.player.viewport().fullscreen);
    assert!((rig.player.state().scale - 1.5).abs() < 1e-6);
    assert!(settle(&mut rig.player, t0 + secs(3)));
    assert_eq!(
        rig.player.drain_events(),
        vec![PlayerEvent::Painted { page: 1 }]
    );
    assert_eq!(rig.player.state().current_page, 1);
}

#[test]
fn test_denied_fullscreen_keeps_tv_running() {
    let t0 = Instant::now();
    let mut viewport = FakeViewport::new(400.0, 300.0);
    viewport.deny_fullscreen = true;
    let mut rig = TestRigBuilder::new()
        .viewport(viewport)
        .document("menu.pdf", fake_document(2, 100, 100))
        .build();
    rig.player.set_locator(Locator::parse("menu.pdf"), t0);
    rig.player.set_tv_mode(true, t0);
    assert!(settle(&mut rig.player, t0));

    rig.player.tick(t0 + secs(3));
    assert_eq!(rig.player.viewport().fullscreen_requests, 1);
    assert!(!rig.player.viewport().fullscreen);
    assert!(rig.player.state().tv_mode_enabled);

    step(&mut rig, t0 + secs(8));
    assert_eq!(rig.player.state().current_page, 2);
}

#[test]
fn test_leaving_tv_before_grace_skips_fullscreen() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(1), ScriptedDeck::default(), t0);
    rig.player.set_tv_mode(false, t0 + secs(1));
    rig.player.tick(t0 + secs(5));
    assert_eq!(rig.player.viewport().fullscreen_requests, 0);
    assert!(!rig.player.is_fullscreen_pending());
}

#[test]
fn test_document_end_shows_board_then_returns() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(2), ScriptedDeck::with_slides(2), t0);

    step(&mut rig, t0 + secs(8));
    assert_eq!(rig.player.state().current_page, 2);
    assert!(!rig.player.phase().is_board());

    step(&mut rig, t0 + secs(16));
    assert_eq!(board_position(&rig), Some(("s0".to_string(), 0, 2)));
    assert_eq!(rig.player.armed_timers(), 1);

    step(&mut rig, t0 + secs(24));
    assert_eq!(board_position(&rig), Some(("s1".to_string(), 1, 2)));

    step(&mut rig, t0 + secs(32));
    assert_eq!(board_position(&rig), None);
    assert_eq!(rig.player.state().current_page, 1);
    assert_eq!(rig.player.armed_timers(), 1);
    assert!(
        rig.player
            .drain_events()
            .contains(&PlayerEvent::Painted { page: 1 })
    );
    assert_eq!(rig.deck.fetch_count(), 1);
}

#[test]
fn test_board_disabled_loops_the_document() {
    let t0 = Instant::now();
    let mut rig = TestRigBuilder::new()
        .config(signboard::playback::PlayerConfig {
            board_enabled: false,
            ..Default::default()
        })
        .document("menu.pdf", fake_document(1, 100, 100))
        .deck(ScriptedDeck::with_slides(3))
        .build();
    rig.player.set_locator(Locator::parse("menu.pdf"), t0);
    rig.player.set_tv_mode(true, t0);
    assert!(settle(&mut rig.player, t0));

    step(&mut rig, t0 + secs(8));
    assert!(!rig.player.phase().is_board());
    assert_eq!(rig.deck.fetch_count(), 0);
}

#[test]
fn test_empty_deck_without_document_holds_placeholder() {
    let t0 = Instant::now();
    let mut rig = tv_rig(None, ScriptedDeck::default(), t0);
    assert!(!rig.player.phase().is_board());
    assert_eq!(rig.deck.fetch_count(), 1);
    assert_eq!(rig.player.armed_timers(), 1);

    step(&mut rig, t0 + secs(8));
    assert!(!rig.player.phase().is_board());
    assert_eq!(rig.deck.fetch_count(), 2);

    step(&mut rig, t0 + secs(16));
    assert_eq!(rig.deck.fetch_count(), 3);

    // slides published meanwhile show up on the next check
    rig.deck.set(vec![AnnouncementSlide::new("news", "News")]);
    step(&mut rig, t0 + secs(24));
    assert_eq!(board_position(&rig), Some(("news".to_string(), 0, 1)));
}

#[test]
fn test_board_wrap_without_document_refetches() {
    let t0 = Instant::now();
    let mut rig = tv_rig(None, ScriptedDeck::with_slides(2), t0);

    assert_eq!(board_position(&rig), Some(("s0".to_string(), 0, 2)));
    step(&mut rig, t0 + secs(8));
    assert_eq!(board_position(&rig), Some(("s1".to_string(), 1, 2)));

    step(&mut rig, t0 + secs(16));
    assert_eq!(rig.deck.fetch_count(), 2);
    assert_eq!(board_position(&rig), Some(("s0".to_string(), 0, 2)));
}

#[test]
fn test_board_wrap_into_empty_deck_shows_placeholder() {
    let t0 = Instant::now();
    let mut rig = tv_rig(None, ScriptedDeck::with_slides(1), t0);
    assert!(rig.player.phase().is_board());

    rig.deck.set(Vec::new());
    step(&mut rig, t0 + secs(8));
    assert!(!rig.player.phase().is_board());
    assert_eq!(rig.player.armed_timers(), 1);
}

#[test]
fn test_deck_failure_counts_as_empty() {
    let t0 = Instant::now();
    let deck = ScriptedDeck::with_slides(2);
    deck.set_failing(true);
    let mut rig = tv_rig(Some(1), deck, t0);

    step(&mut rig, t0 + secs(8));
    assert!(!rig.player.phase().is_board());
    assert_eq!(rig.deck.fetch_count(), 1);
    assert_eq!(rig.player.state().current_page, 1);
    assert_eq!(rig.player.armed_timers(), 1);
}

#[test]
fn test_leaving_tv_cancels_pending_deck_check() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(1), ScriptedDeck::with_slides(2), t0);

    rig.player.tick(t0 + secs(8));
    assert!(rig.player.is_deck_check_pending());
    rig.player.set_tv_mode(false, t0 + secs(8));
    assert!(!rig.player.is_deck_check_pending());

    assert!(settle(&mut rig.player, t0 + secs(8)));
    // let the stale reply arrive
    std::thread::sleep(Duration::from_millis(50));
    rig.player.pump(t0 + secs(9));
    assert!(!rig.player.phase().is_board());
}

#[test]
fn test_hidden_slides_are_skipped() {
    let t0 = Instant::now();
    let mut hidden = AnnouncementSlide::new("hidden", "Hidden");
    hidden.is_visible = false;
    let deck = ScriptedDeck::new(vec![
        AnnouncementSlide::new("a", "First"),
        hidden,
        AnnouncementSlide::new("b", "Second"),
    ]);
    let mut rig = tv_rig(None, deck, t0);

    assert_eq!(board_position(&rig), Some(("a".to_string(), 0, 2)));
    step(&mut rig, t0 + secs(8));
    assert_eq!(board_position(&rig), Some(("b".to_string(), 1, 2)));
}

#[test]
fn test_manual_navigation_walks_the_board() {
    let t0 = Instant::now();
    let mut rig = tv_rig(None, ScriptedDeck::with_slides(3), t0);
    assert_eq!(board_position(&rig).map(|p| p.1), Some(0));

    rig.player.next_page(t0 + secs(1));
    assert_eq!(board_position(&rig).map(|p| p.1), Some(1));
    rig.player.prev_page(t0 + secs(2));
    rig.player.prev_page(t0 + secs(2));
    assert_eq!(board_position(&rig).map(|p| p.1), Some(0));
}

#[test]
fn test_tv_mode_refits_on_resize() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(1), ScriptedDeck::default(), t0);
    // 100x100 page in a 400x300 box, no padding
    assert!((rig.player.state().scale - 3.0).abs() < 1e-6);

    rig.player.viewport_mut().size = ViewportBox::new(100.0, 50.0);
    rig.player.on_resize(t0);
    assert!(settle(&mut rig.player, t0));
    assert!((rig.player.state().scale - 0.5).abs() < 1e-6);
}

#[test]
fn test_board_shows_at_once_without_document() {
    let t0 = Instant::now();
    let mut rig = TestRigBuilder::new()
        .deck(ScriptedDeck::with_slides(2))
        .build();

    rig.player.set_tv_mode(true, t0);
    assert!(rig.player.is_deck_check_pending());
    assert!(settle(&mut rig.player, t0));
    assert_eq!(board_position(&rig), Some(("s0".to_string(), 0, 2)));
    assert_eq!(rig.player.armed_timers(), 1);
}

#[test]
fn test_closing_document_in_tv_mode_shows_board() {
    let t0 = Instant::now();
    let mut rig = tv_rig(Some(2), ScriptedDeck::with_slides(1), t0);
    assert!(!rig.player.phase().is_board());
    assert_eq!(rig.deck.fetch_count(), 0);

    rig.player.set_locator(None, t0 + secs(1));
    assert!(settle(&mut rig.player, t0 + secs(1)));
    assert_eq!(board_position(&rig), Some(("s0".to_string(), 0, 1)));
}

#[test]
fn test_failed_load_in_tv_mode_shows_board() {
    let t0 = Instant::now();
    let mut rig = tv_rig(None, ScriptedDeck::default(), t0);
    rig.deck.set(vec![AnnouncementSlide::new("news", "News")]);

    rig.player.set_locator(Locator::parse("offline.pdf"), t0 + secs(1));
    assert!(!rig.player.is_deck_check_pending());
    assert!(settle(&mut rig.player, t0 + secs(1)));
    assert_eq!(board_position(&rig), Some(("news".to_string(), 0, 1)));
}
