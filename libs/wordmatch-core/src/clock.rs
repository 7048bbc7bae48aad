//! Round timer evaluated on demand.

use chrono::{DateTime, Duration, Utc};

/// Start time and limit of a round. Nothing runs in the background; callers
/// pass the current time in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    started_at: DateTime<Utc>,
    time_limit: Duration,
}

impl SessionClock {
    pub fn new(started_at: DateTime<Utc>, time_limit: Duration) -> Self {
        Self {
            started_at,
            time_limit,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).max(Duration::zero())
    }

    /// Time left, clamped to zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.time_limit - self.elapsed(now)).max(Duration::zero())
    }

    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at >= self.time_limit
    }
}
