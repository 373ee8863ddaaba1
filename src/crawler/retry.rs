//! Navigation retry with exponential backoff
//!
//! Timeouts, non-2xx responses and document-context anomalies are retried.
//! The wait after failed attempt `n` is `backoff_base * 2^n` (2×, 4×, 8× the
//! base). No wait follows the final attempt.

use crate::config::ScraperConfig;
use crate::crawler::{ScrapeEvent, ScrapeObserver};
use crate::document::{Document, Navigation, NavigateOptions};
use crate::ErrorClass;
use std::time::Duration;

/// How a retried navigation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Navigated(Navigation),

    /// Every attempt failed; callers treat the page's data as unavailable
    NotNavigated { attempts: u32, reason: String },
}

impl NavigationOutcome {
    pub fn is_navigated(&self) -> bool {
        matches!(self, Self::Navigated(_))
    }
}

/// Bounded retry policy for navigations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_base())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff after the given failed attempt (1-based): `base * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }

    /// Navigates `doc` to `url`, retrying retryable failures
    ///
    /// Never raises: exhaustion (or a non-retryable error) yields
    /// [`NavigationOutcome::NotNavigated`].
    pub async fn navigate<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        url: &str,
        options: NavigateOptions,
        observer: &dyn ScrapeObserver,
    ) -> NavigationOutcome {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let reason = match doc.navigate(url, options).await {
                Ok(navigation) if navigation.ok() => {
                    return NavigationOutcome::Navigated(navigation);
                }
                Ok(navigation) => format!("HTTP status {}", navigation.status),
                Err(e) if e.class() == ErrorClass::Retryable => e.to_string(),
                Err(e) => {
                    let reason = e.to_string();
                    observer.on_event(&ScrapeEvent::NavigationFailed {
                        url: url.to_string(),
                        attempts: attempt,
                        reason: reason.clone(),
                    });
                    return NavigationOutcome::NotNavigated {
                        attempts: attempt,
                        reason,
                    };
                }
            };

            let exhausted = attempt >= self.max_attempts;
            let next_delay = (!exhausted).then(|| self.delay_for(attempt));

            observer.on_event(&ScrapeEvent::NavigationRetry {
                url: url.to_string(),
                attempt,
                max_attempts: self.max_attempts,
                reason: reason.clone(),
                next_delay,
            });

            match next_delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    observer.on_event(&ScrapeEvent::NavigationFailed {
                        url: url.to_string(),
                        attempts: attempt,
                        reason: reason.clone(),
                    });
                    return NavigationOutcome::NotNavigated {
                        attempts: attempt,
                        reason,
                    };
                }
            }
        }
    }
}
