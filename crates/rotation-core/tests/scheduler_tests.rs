//! Daily schedule waiting behavior driven by a fake clock.

use chrono::Timelike;
use rotation_core::scheduler::{seconds_since_midnight, COARSE_POLL, FINE_POLL};
use rotation_core::{Clock, DailySchedule, ScheduledInstant};
use rotation_test_utils::{fixed_time, FakeClock};
use std::time::Duration;

fn schedule_at(h: u32, m: u32, s: u32) -> DailySchedule {
    DailySchedule::new(ScheduledInstant::new(h * 3600 + m * 60 + s).unwrap())
}

#[tokio::test]
async fn resolves_immediately_at_target() {
    let clock = FakeClock::at(4, 0, 0);
    let mut schedule = schedule_at(4, 0, 0);

    let fired = schedule.next_tick(&clock).await;

    assert_eq!(fired, fixed_time(4, 0, 0));
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn fine_polls_inside_approach_window() {
    let clock = FakeClock::at(3, 59, 0);
    let mut schedule = schedule_at(4, 0, 0);

    let fired = schedule.next_tick(&clock).await;

    assert_eq!(fired, fixed_time(4, 0, 0));
    assert_eq!(clock.sleeps(), vec![FINE_POLL; 30]);
}

#[tokio::test]
async fn coarse_then_fine_polling() {
    let clock = FakeClock::at(3, 50, 0);
    let mut schedule = schedule_at(4, 0, 0);

    schedule.next_tick(&clock).await;

    let sleeps = clock.sleeps();
    let coarse: Vec<_> = sleeps.iter().take_while(|d| **d > FINE_POLL).collect();
    assert!(coarse.iter().all(|d| **d <= COARSE_POLL));
    // 10 minutes away: 7 minutes coarse, 3 minutes fine
    assert_eq!(coarse.iter().map(|d| **d).sum::<Duration>(), Duration::from_secs(420));
    assert_eq!(sleeps.len() - coarse.len(), 90);
    assert_eq!(clock.total_slept(), Duration::from_secs(600));
}

#[tokio::test]
async fn passed_target_waits_across_midnight() {
    let clock = FakeClock::at(23, 0, 0);
    let mut schedule = schedule_at(0, 30, 0);

    let fired = schedule.next_tick(&clock).await;

    assert_eq!(fired.date_naive(), fixed_time(0, 0, 0).date_naive().succ_opt().unwrap());
    assert_eq!(seconds_since_midnight(fired), 30 * 60);
    assert_eq!(clock.total_slept(), Duration::from_secs(90 * 60));
}

#[tokio::test]
async fn target_just_passed_waits_a_full_day() {
    let clock = FakeClock::at(4, 0, 1);
    let mut schedule = schedule_at(4, 0, 0);

    let fired = schedule.next_tick(&clock).await;

    assert_eq!((fired.hour(), fired.minute(), fired.second()), (4, 0, 0));
    assert_eq!(clock.total_slept(), Duration::from_secs(24 * 3600 - 1));
}

#[tokio::test]
async fn second_tick_on_same_day_waits_for_tomorrow() {
    let clock = FakeClock::at(4, 0, 0);
    let mut schedule = schedule_at(4, 0, 0);

    schedule.next_tick(&clock).await;
    assert!(clock.sleeps().is_empty());

    let fired = schedule.next_tick(&clock).await;

    assert_eq!(fired, fixed_time(4, 0, 0) + chrono::Duration::days(1));
    assert_eq!(schedule.last_fired(), Some(fired.date_naive()));
}

#[tokio::test]
async fn overshooting_sleep_still_resolves() {
    let clock = OvershootingClock::new(FakeClock::at(3, 59, 57));
    let mut schedule = schedule_at(4, 0, 0);

    let fired = schedule.next_tick(&clock).await;

    assert!(fired >= fixed_time(4, 0, 0));
    assert!(fired < fixed_time(4, 0, 10));
}

#[tokio::test]
async fn late_wakeup_past_midnight_keeps_next_days_run() {
    let clock = OvershootingClock::new(FakeClock::at(23, 59, 57));
    let mut schedule = schedule_at(23, 59, 59);

    let fired = schedule.next_tick(&clock).await;

    assert_eq!(fired, fixed_time(0, 0, 0) + chrono::Duration::days(1));
    assert_eq!(schedule.last_fired(), Some(fixed_time(0, 0, 0).date_naive()));

    let next_day = fixed_time(23, 59, 59) + chrono::Duration::days(1);
    clock.0.set(next_day);
    let slept_before = clock.0.sleeps().len();

    let fired = schedule.next_tick(&clock).await;

    assert_eq!(fired, next_day);
    assert_eq!(clock.0.sleeps().len(), slept_before);
}

/// Adds one extra second to every sleep
struct OvershootingClock(FakeClock);

impl OvershootingClock {
    fn new(inner: FakeClock) -> Self {
        Self(inner)
    }
}

#[async_trait::async_trait]
impl Clock for OvershootingClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.0.now()
    }

    async fn sleep(&self, duration: Duration) {
        self.0.sleep(duration + Duration::from_secs(1)).await;
    }
}
