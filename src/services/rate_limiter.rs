use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::{sleep, Duration, Instant};
use tracing::info;

/// Per-domain minimum spacing between outbound calls. One instance is
/// shared across a job run; each domain gets its own last-call timestamp so
/// throttling one source never delays another. Overrides are mutable at
/// runtime so a scraper can register a site's published `Crawl-delay` the
/// first time it reads that site's `robots.txt`.
pub struct DomainRateLimiter {
    default_spacing: Duration,
    overrides: DashMap<String, Duration>,
    last_call: DashMap<String, Arc<Mutex<Instant>>>,
}

impl DomainRateLimiter {
    pub fn new(default_spacing: Duration) -> Self {
        Self {
            default_spacing,
            overrides: DashMap::new(),
            last_call: DashMap::new(),
        }
    }

    pub fn with_override(self, domain: impl Into<String>, spacing: Duration) -> Self {
        self.overrides.insert(domain.into(), spacing);
        self
    }

    /// Registers a domain-specific spacing at runtime, overriding the
    /// default for every subsequent `wait` against that domain. Used when a
    /// source's `robots.txt` declares a `Crawl-delay` longer than our
    /// default spacing.
    pub fn set_override(&self, domain: impl Into<String>, spacing: Duration) {
        let domain = domain.into();
        info!("registering crawl-delay override for {}: {:?}", domain, spacing);
        self.overrides.insert(domain, spacing);
    }

    fn spacing_for(&self, domain: &str) -> Duration {
        self.overrides
            .get(domain)
            .map(|d| *d)
            .unwrap_or(self.default_spacing)
    }

    /// Blocks until `spacing_for(domain)` has elapsed since the last call to
    /// this domain, then records the new call instant.
    pub async fn wait(&self, domain: &str) {
        let spacing = self.spacing_for(domain);
        let slot = self
            .last_call
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Instant::now() - spacing)))
            .clone();

        let wait_for = {
            let last = slot.lock();
            let elapsed = last.elapsed();
            if elapsed < spacing {
                Some(spacing - elapsed)
            } else {
                None
            }
        };

        if let Some(delay) = wait_for {
            sleep(delay).await;
        }

        *slot.lock() = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn enforces_spacing_per_domain() {
        let limiter = DomainRateLimiter::new(Duration::from_millis(200));

        let start = StdInstant::now();
        limiter.wait("a.com").await;
        assert!(start.elapsed().as_millis() < 50);

        limiter.wait("a.com").await;
        assert!(start.elapsed().as_millis() >= 180);
    }

    #[tokio::test]
    async fn domains_are_independent() {
        let limiter = DomainRateLimiter::new(Duration::from_millis(500));

        let start = StdInstant::now();
        limiter.wait("a.com").await;
        limiter.wait("b.com").await;
        assert!(start.elapsed().as_millis() < 100);
    }

    #[tokio::test]
    async fn override_spacing_applies_per_domain() {
        let limiter = DomainRateLimiter::new(Duration::from_millis(500))
            .with_override("fast.com", Duration::from_millis(10));

        let start = StdInstant::now();
        limiter.wait("fast.com").await;
        limiter.wait("fast.com").await;
        assert!(start.elapsed().as_millis() < 100);
    }

    #[tokio::test]
    async fn runtime_override_takes_effect_on_next_wait() {
        let limiter = DomainRateLimiter::new(Duration::from_millis(10));
        limiter.wait("slow.com").await;
        limiter.set_override("slow.com", Duration::from_millis(300));

        let start = StdInstant::now();
        limiter.wait("slow.com").await;
        assert!(start.elapsed().as_millis() >= 280);
    }
}
