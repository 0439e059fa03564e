use std::time::Duration;
use tokio::time::Instant;

/// Time-based gate deciding whether a progress event may fire.
///
/// The gate never records emissions itself; callers update their own
/// `last_emit` timestamp only when they actually publish.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleGate {
    interval: Duration,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// True when at least `interval` has elapsed since `last_emit`.
    pub fn can_emit(&self, last_emit: Instant) -> bool {
        self.can_emit_at(last_emit, Instant::now())
    }

    pub fn can_emit_at(&self, last_emit: Instant, now: Instant) -> bool {
        // A zero interval disables throttling.
        self.interval.is_zero() || now.saturating_duration_since(last_emit) >= self.interval
    }
}
