//! Randomized request throttling

use crate::config::ScraperConfig;
use rand::Rng;
use std::time::Duration;

/// Delay inserted after every item and every page transition
///
/// Each wait lasts `base` plus a uniformly random jitter in `[0, jitter]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    base: Duration,
    jitter: Duration,
}

impl Throttle {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(
            Duration::from_millis(config.throttle_delay_ms),
            Duration::from_millis(config.throttle_jitter_ms),
        )
    }

    /// Draws the length of the next wait
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::trace!("Throttling for {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
