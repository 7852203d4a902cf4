//! Fixed-period ticker driving the scanline while a game is running.

use std::time::{Duration, Instant};

/// Default scanline period.
pub const TICK_PERIOD: Duration = Duration::from_millis(150);

/// Upper bound on firings reported by one poll; beyond it the schedule resyncs to `now`.
pub const MAX_CATCH_UP: u32 = 4;

/// Fixed-period schedule. Created when a session starts and dropped when it leaves PLAYING.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Instant,
    fired: u64,
}

impl Ticker {
    /// First firing is one period after `start`.
    pub fn new(start: Instant, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_due: start + period,
            fired: 0,
        }
    }

    /// Total firings since creation.
    #[inline]
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Time until the next firing (zero if already due).
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }

    /// Number of firings due at `now`. Consumes them.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let mut due = 0;
        while now >= self.next_due {
            if due == MAX_CATCH_UP {
                // Stalled loop: drop the backlog instead of replaying it.
                self.next_due = now + self.period;
                break;
            }
            due += 1;
            self.next_due += self.period;
        }
        self.fired += u64::from(due);
        due
    }
}
