//! Daily trigger
//!
//! Waits until the UTC time of day reaches a [`ScheduledInstant`] with a
//! two-phase poll: coarse sleeps of up to a minute until the target is within
//! the approach window, then two-second sleeps until it is reached.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use std::time::Duration;

use crate::clock::Clock;
use crate::types::{ScheduledInstant, SECONDS_PER_DAY};

/// Coarse polling interval
pub const COARSE_POLL: Duration = Duration::from_secs(60);
/// Fine polling interval
pub const FINE_POLL: Duration = Duration::from_secs(2);
/// Distance from the target at which fine polling starts
pub const APPROACH_WINDOW: Duration = Duration::from_secs(180);

/// Whole seconds since UTC midnight
#[inline]
#[must_use]
pub fn seconds_since_midnight(now: DateTime<Utc>) -> u32 {
    now.num_seconds_from_midnight()
}

/// Seconds from `now` forward to the next occurrence of `target`, in
/// `[0, SECONDS_PER_DAY)`
#[inline]
#[must_use]
pub fn seconds_until(now: DateTime<Utc>, target: ScheduledInstant) -> u32 {
    (target.seconds() + SECONDS_PER_DAY - seconds_since_midnight(now)) % SECONDS_PER_DAY
}

/// Fires once per UTC day at a fixed instant
#[derive(Debug, Clone)]
pub struct DailySchedule {
    instant: ScheduledInstant,
    last_fired: Option<NaiveDate>,
}

impl DailySchedule {
    /// Create schedule
    #[inline]
    #[must_use]
    pub fn new(instant: ScheduledInstant) -> Self {
        Self {
            instant,
            last_fired: None,
        }
    }

    /// Trigger instant
    #[inline]
    #[must_use]
    pub fn instant(&self) -> ScheduledInstant {
        self.instant
    }

    /// UTC date of the last occurrence that fired
    #[inline]
    #[must_use]
    pub fn last_fired(&self) -> Option<NaiveDate> {
        self.last_fired
    }

    /// Resolve when the time of day reaches the instant.
    ///
    /// Returns immediately when it already equals the instant, unless this
    /// schedule already fired today. Returns the time at which it resolved.
    pub async fn next_tick(&mut self, clock: &dyn Clock) -> DateTime<Utc> {
        let approach = APPROACH_WINDOW.as_secs() as u32;

        let mut remaining = self.remaining(clock.now());
        if remaining > approach {
            tracing::info!(
                instant = %self.instant,
                wait_secs = remaining,
                "waiting for next rotation window"
            );
        }

        while remaining > approach {
            let nap = (remaining - approach).min(COARSE_POLL.as_secs() as u32);
            tracing::debug!(remaining, nap, "coarse poll");
            clock.sleep(Duration::from_secs(u64::from(nap))).await;
            remaining = self.remaining(clock.now());
        }

        let mut overshoot = 0;
        while remaining > 0 {
            let nap = remaining.min(FINE_POLL.as_secs() as u32);
            tracing::debug!(remaining, nap, "fine poll");
            clock.sleep(Duration::from_secs(u64::from(nap))).await;
            let next = self.remaining(clock.now());
            if next > remaining {
                // slept past the target
                overshoot = SECONDS_PER_DAY - next;
                break;
            }
            remaining = next;
        }

        let fired_at = clock.now();
        // the occurrence's date, not the wakeup's, so a late wakeup past
        // midnight does not consume the next day's run
        let occurrence = fired_at - chrono::Duration::seconds(i64::from(overshoot));
        self.last_fired = Some(occurrence.date_naive());
        tracing::info!(instant = %self.instant, at = %fired_at, "rotation window reached");
        fired_at
    }

    fn remaining(&self, now: DateTime<Utc>) -> u32 {
        match seconds_until(now, self.instant) {
            0 if self.last_fired == Some(now.date_naive()) => SECONDS_PER_DAY,
            distance => distance,
        }
    }
}
