use chrono::{DateTime, Duration, Utc};

/// Client-side session timer. Advisory only: the server's expiry sweep
/// decides when a hold really ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    hold: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl Countdown {
    pub fn new(hold: Duration) -> Self {
        Self { hold, deadline: None }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.hold);
    }

    /// Run until the server-issued `deadline` instead of the default hold.
    pub fn start_at(&mut self, deadline: DateTime<Utc>) {
        self.deadline = Some(deadline);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline.map(|d| (d - now).max(Duration::zero()))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}
