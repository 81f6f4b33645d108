//! Poll interval bookkeeping and wall-clock access.

use embassy_time::{Duration, Instant};

/// Fires once per interval on a monotonic clock.
///
/// The caller passes `now` in, so the timer works the same with
/// `Instant::now()` on a device and with fixed instants in tests.
#[derive(Debug, Clone, Copy)]
pub struct PollTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl PollTimer {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True on the first call and whenever a full interval has passed since the
    /// last firing. Firing resets the reference point to `now`.
    pub fn is_due(
        &mut self,
        now: Instant,
    ) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }

    /// Time left until the next firing; zero when already due.
    pub fn remaining(
        &self,
        now: Instant,
    ) -> Duration {
        match self.last {
            None => Duration::from_ticks(0),
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed >= self.interval {
                    Duration::from_ticks(0)
                } else {
                    self.interval - elapsed
                }
            }
        }
    }
}

/// Source of the current Unix time.
pub trait WallClock {
    /// Seconds since the Unix epoch, or `None` before the clock is set.
    fn epoch_secs(&self) -> Option<i64>;
}
