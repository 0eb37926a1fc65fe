use peditor_core::Notice;
use std::time::{Duration, Instant};

/// How long a notice stays in the footer
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

/// A notice with its expiry
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveNotice {
    pub notice: Notice,
    pub expires_at: Instant,
}

impl ActiveNotice {
    pub fn new(notice: Notice, now: Instant) -> Self {
        Self { notice, expires_at: now + NOTICE_TTL }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}
