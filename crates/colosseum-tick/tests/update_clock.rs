//! Integration tests for the update clock, on paused Tokio time.

use std::time::Duration;

use colosseum_tick::{ClockConfig, UpdateClock};

fn steady(rate_hz: u32) -> UpdateClock {
    UpdateClock::new(ClockConfig {
        start_jitter: Duration::ZERO,
        ..ClockConfig::with_rate(rate_hz)
    })
}

#[test]
fn test_config_period() {
    assert_eq!(ClockConfig::default().period(), None);
    assert_eq!(
        ClockConfig::with_rate(20).period(),
        Some(Duration::from_millis(50))
    );
}

#[test]
fn test_rate_is_clamped() {
    let clock = UpdateClock::new(ClockConfig {
        rate_hz: 1_000,
        slow_update_ratio: 7.0,
        start_jitter: Duration::ZERO,
    });
    assert_eq!(clock.rate_hz(), ClockConfig::MAX_RATE_HZ);
    assert!(!clock.is_event_driven());
}

#[test]
fn test_zero_rate_is_event_driven() {
    let clock = UpdateClock::with_rate(0);
    assert!(clock.is_event_driven());
    assert_eq!(clock.period(), None);
    assert_eq!(clock.ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_steady_ticks() {
    let mut clock = steady(20);
    for expected in 1..=3 {
        let tick = clock.next_tick().await;
        assert_eq!(tick.number, expected);
        assert_eq!(tick.dt, Duration::from_millis(50));
        assert_eq!(tick.missed, 0);
        clock.finish_tick();
    }
    assert_eq!(clock.ticks(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_carries_elapsed_time() {
    let mut clock = steady(20);

    // Due at 50ms, collected at 175ms.
    tokio::time::advance(Duration::from_millis(175)).await;
    let tick = clock.next_tick().await;
    assert_eq!(tick.dt, Duration::from_millis(175));
    assert_eq!(tick.missed, 2);

    // No burst afterwards: the next tick is one period later.
    let tick = clock.next_tick().await;
    assert_eq!(tick.dt, Duration::from_millis(50));
    assert_eq!(tick.missed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_event_driven_never_fires() {
    let mut clock = UpdateClock::with_rate(0);
    let fired = tokio::time::timeout(Duration::from_secs(30), clock.next_tick()).await;
    assert!(fired.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_loses_no_time() {
    let mut clock = steady(10);
    let early = tokio::time::timeout(Duration::from_millis(40), clock.next_tick()).await;
    assert!(early.is_err());

    let tick = clock.next_tick().await;
    assert_eq!(tick.number, 1);
    assert_eq!(tick.dt, Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_finish_without_tick_is_noop() {
    let mut clock = steady(20);
    clock.finish_tick();
    clock.next_tick().await;
    clock.finish_tick();
    clock.finish_tick();
    assert_eq!(clock.ticks(), 1);
}
