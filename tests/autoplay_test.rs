use std::time::{Duration, Instant};

use signboard::playback::{Locator, PlayerEvent};
use signboard::test_utils::fakes::*;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn loaded_rig(pages: usize, now: Instant) -> TestRig {
    let mut rig = TestRigBuilder::new()
        .document("menu.pdf", fake_document(pages, 100, 100))
        .build();
    rig.player.set_locator(Locator::parse("menu.pdf"), now);
    assert!(settle(&mut rig.player, now));
    rig.player.drain_events();
    rig
}

#[test]
fn test_at_most_one_timer_is_armed() {
    let t0 = Instant::now();
    let mut rig = loaded_rig(3, t0);

    assert_eq!(rig.player.armed_timers(), 0);
    rig.player.toggle_autoplay(t0);
    assert_eq!(rig.player.armed_timers(), 1);
    rig.player.toggle_autoplay(t0);
    assert_eq!(rig.player.armed_timers(), 0);

    rig.player.set_tv_mode(true, t0);
    assert!(rig.player.state().autoplay_enabled);
    assert_eq!(rig.player.armed_timers(), 1);
    rig.player.set_tv_mode(false, t0);
    assert!(!rig.player.state().autoplay_enabled);
    assert_eq!(rig.player.armed_timers(), 0);
}

#[test]
fn test_autoplay_advances_each_interval() {
    let t0 = Instant::now();
    let mut rig = loaded_rig(3, t0);
    rig.player.toggle_autoplay(t0);

    rig.player.tick(t0 + secs(7));
    assert_eq!(rig.player.state().current_page, 1);

    rig.player.tick(t0 + secs(8));
    assert_eq!(rig.player.state().current_page, 2);
    assert!(settle(&mut rig.player, t0 + secs(8)));

    rig.player.tick(t0 + secs(16));
    assert_eq!(rig.player.state().current_page, 3);
}

#[test]
fn test_autoplay_wraps_to_first_page_outside_tv_mode() {
    let t0 = Instant::now();
    let mut rig = loaded_rig(3, t0);
    rig.player.go_to(3, false, t0);
    assert!(settle(&mut rig.player, t0));
    rig.player.toggle_autoplay(t0);

    rig.player.tick(t0 + secs(8));
    assert_eq!(rig.player.state().current_page, 1);
    assert!(settle(&mut rig.player, t0 + secs(8)));
    assert!(
        rig.player
            .drain_events()
            .contains(&PlayerEvent::Painted { page: 1 })
    );
}

#[test]
fn test_stalled_loop_advances_only_once() {
    let t0 = Instant::now();
    let mut rig = loaded_rig(10, t0);
    rig.player.toggle_autoplay(t0);

    rig.player.tick(t0 + secs(60));
    assert_eq!(rig.player.state().current_page, 2);

    // the cadence restarts from the late tick
    rig.player.tick(t0 + secs(61));
    assert_eq!(rig.player.state().current_page, 2);
    rig.player.tick(t0 + secs(68));
    assert_eq!(rig.player.state().current_page, 3);
}

#[test]
fn test_manual_navigation_rearms_the_timer() {
    let t0 = Instant::now();
    let mut rig = loaded_rig(5, t0);
    rig.player.toggle_autoplay(t0);

    rig.player.next_page(t0 + secs(6));
    assert_eq!(rig.player.state().current_page, 2);

    rig.player.tick(t0 + secs(8));
    assert_eq!(rig.player.state().current_page, 2);
    rig.player.tick(t0 + secs(14));
    assert_eq!(rig.player.state().current_page, 3);
}

#[test]
fn test_cycling_interval_emits_change_and_rearms() {
    let t0 = Instant::now();
    let mut rig = loaded_rig(5, t0);
    rig.player.toggle_autoplay(t0);

    rig.player.cycle_interval(t0 + secs(1));
    assert_eq!(rig.player.state().autoplay_interval_ms, 10_000);
    assert_eq!(
        rig.player.drain_events(),
        vec![PlayerEvent::IntervalChanged(10_000)]
    );

    rig.player.tick(t0 + secs(9));
    assert_eq!(rig.player.state().current_page, 1);
    rig.player.tick(t0 + secs(11));
    assert_eq!(rig.player.state().current_page, 2);
}

#[test]
fn test_interval_cycle_wraps_around() {
    let t0 = Instant::now();
    let mut rig = loaded_rig(1, t0);
    let mut seen = Vec::new();
    for _ in 0..5 {
        rig.player.cycle_interval(t0);
        seen.push(rig.player.state().autoplay_interval_ms);
    }
    assert_eq!(seen, vec![10_000, 15_000, 20_000, 5_000, 8_000]);
}

#[test]
fn test_autoplay_without_document_stays_put() {
    let t0 = Instant::now();
    let mut rig = TestRigBuilder::new().build();
    rig.player.toggle_autoplay(t0);
    rig.player.tick(t0 + secs(8));
    rig.player.tick(t0 + secs(16));
    assert_eq!(rig.player.state().current_page, 1);
    assert!(rig.player.is_idle());
}
