use std::time::Duration;

use brisca_store::{PacingPolicy, TimerConfig};

/// Knobs for one session, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between two polls of the action feed.
    pub poll_interval: Duration,
    pub pacing: PacingPolicy,
    pub timers: TimerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_millis(200), pacing: PacingPolicy::default(), timers: TimerConfig::default() }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let poll_ms: u64 = std::env::var("BRISCA_POLL_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(200);
        Self {
            poll_interval: Duration::from_millis(poll_ms.max(1)),
            pacing: PacingPolicy::from_env(),
            timers: TimerConfig::from_env(),
        }
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
