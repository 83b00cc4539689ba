use crate::config::CrawlerConfig;
use std::time::Duration;

/// Jittered exponential backoff policy
///
/// One policy serves two purposes: attempt 0 is the routine inter-page
/// pacing delay, and attempts 1.. grow the wait after detected transient
/// failures. Each delay is `base * 2^attempt`, capped, plus a uniform
/// random jitter so repeated requests do not land on a fixed cadence.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base: Duration,
    cap: Duration,
    jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration, jitter: Duration) -> Self {
        Self { base, cap, jitter }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            Duration::from_millis(config.jitter_ms),
        )
    }

    /// Returns the delay to wait before the given attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        // 2^attempt saturates well before the cap matters
        let factor = 1u32 << attempt.min(20);
        let scaled = self.base.saturating_mul(factor).min(self.cap);

        scaled + self.jitter_part()
    }

    fn jitter_part(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::random::<u64>() % jitter_ms)
    }
}
