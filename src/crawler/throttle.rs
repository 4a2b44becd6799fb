//! Crawl-delay enforcement
//!
//! Only network fetches are spaced out. A page served from the cache neither
//! waits nor resets the clock, so a run over fully cached pages finishes
//! without sleeping.

use std::time::Duration;
use tokio::time::Instant;

/// Tracks the last network fetch and enforces the crawl delay
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    last_fetch: Option<Instant>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fetch: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Calculates the time until the next fetch may start
    ///
    /// Returns None if a fetch can start now.
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        let last = self.last_fetch?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.delay {
            Some(self.delay - elapsed)
        } else {
            None
        }
    }

    /// Sleeps until the crawl delay since the previous fetch has passed
    pub async fn wait(&self) {
        if let Some(wait) = self.time_until_ready(Instant::now()) {
            tracing::debug!("Throttling for {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Records that a network fetch just started
    pub fn record_fetch(&mut self) {
        self.record_fetch_at(Instant::now());
    }

    pub fn record_fetch_at(&mut self, now: Instant) {
        self.last_fetch = Some(now);
    }
}
