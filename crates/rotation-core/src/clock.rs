//! Wall-clock abstraction
//!
//! The scheduler and the copy-naming logic read the current UTC time and
//! suspend through this trait, so tests can drive time explicitly.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Source of the current time and of task suspension
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the system time and the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn system_clock_sleeps_on_tokio_timer() {
        let start = tokio::time::Instant::now();
        SystemClock.sleep(Duration::from_secs(60)).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
