use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SourceProfile;
use crate::services::rate_limiter::DomainRateLimiter;

use super::lexicon;
use super::robots::{self, RobotsPolicy};

/// Strips any remaining HTML tags out of an already-bounded content region.
/// Shared across sources — only the boundary regex in `SourceProfile` is
/// source-specific.
const TAG_PATTERN: &str = r"<[^>]+>";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("disallowed by robots.txt")]
    RobotsDisallowed,

    #[error("page returned status {0}")]
    BadStatus(u16),
}

/// A single raw reading straight out of one source, before it is assigned a
/// row id and timestamps by the caller.
#[derive(Debug, Clone)]
pub struct RawSentimentReading {
    pub source: &'static str,
    pub score: f64,
}

/// Fetches a source's page for one symbol, enforcing robots.txt, and scores
/// it with the lexicon. Robots policies are cached per domain for the
/// lifetime of the client so a single job run fetches `robots.txt` once per
/// source regardless of how many symbols it scrapes. A `Crawl-delay`
/// declared by a policy is registered on the shared rate limiter the first
/// time that domain's policy is fetched.
pub struct ScraperClient {
    http: reqwest::Client,
    robots_cache: Arc<DashMap<&'static str, RobotsPolicy>>,
    rate_limiter: Arc<DomainRateLimiter>,
    content_regex_cache: DashMap<&'static str, Arc<Regex>>,
    tag_regex: Regex,
}

impl ScraperClient {
    pub fn new(rate_limiter: Arc<DomainRateLimiter>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("OpenAlpha-Bot/1.0")
                .build()
                .unwrap_or_default(),
            robots_cache: Arc::new(DashMap::new()),
            rate_limiter,
            content_regex_cache: DashMap::new(),
            tag_regex: Regex::new(TAG_PATTERN).expect("static tag-stripping regex"),
        }
    }

    /// Compiles (and caches) a source profile's content-boundary regex.
    /// Falls back to matching the whole body when a profile's pattern is
    /// malformed, so a bad config entry degrades to unscoped extraction
    /// instead of failing the scrape.
    fn content_regex(&self, profile: &SourceProfile) -> Arc<Regex> {
        if let Some(cached) = self.content_regex_cache.get(profile.name) {
            return cached.clone();
        }
        let compiled = Regex::new(profile.content_pattern).unwrap_or_else(|e| {
            warn!(
                source = profile.name,
                error = %e,
                "invalid content_pattern, falling back to whole-body extraction"
            );
            Regex::new(r"(?s)(.*)").expect("static fallback regex")
        });
        let compiled = Arc::new(compiled);
        self.content_regex_cache.insert(profile.name, compiled.clone());
        compiled
    }

    /// Extracts the source-specific content region from a raw HTML body and
    /// strips remaining tags, isolating parsing per source profile rather
    /// than scoring every source off the same unparsed markup.
    fn extract_content(&self, profile: &SourceProfile, body: &str) -> String {
        let pattern = self.content_regex(profile);
        let bounded = pattern
            .captures(body)
            .and_then(|captures| captures.get(1).or_else(|| captures.get(0)))
            .map(|m| m.as_str())
            .unwrap_or(body);
        self.tag_regex.replace_all(bounded, " ").to_string()
    }

    async fn robots_policy(&self, profile: &SourceProfile) -> RobotsPolicy {
        if let Some(cached) = self.robots_cache.get(profile.name) {
            return cached.clone();
        }
        let policy = robots::fetch(&self.http, profile.domain).await;
        if let Some(delay) = policy.crawl_delay {
            self.rate_limiter.set_override(profile.domain, delay);
        }
        self.robots_cache.insert(profile.name, policy.clone());
        policy
    }

    pub async fn collect(
        &self,
        profile: &SourceProfile,
        symbol: &str,
    ) -> Result<RawSentimentReading, ScrapeError> {
        let policy = self.robots_policy(profile).await;

        let url = profile.url_template.replace("{symbol}", &symbol.to_lowercase());
        let path = url::Url::parse(&url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string());

        if !policy.allows(&path) {
            warn!("{} disallows {} by robots.txt", profile.domain, path);
            return Err(ScrapeError::RobotsDisallowed);
        }

        self.rate_limiter.wait(profile.domain).await;

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ScrapeError::BadStatus(resp.status().as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        let content = self.extract_content(profile, &body);
        let score = lexicon::score_text(&content);
        info!("scored {} via {}: {:+.2}", symbol, profile.name, score);

        Ok(RawSentimentReading {
            source: profile.name,
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> ScraperClient {
        ScraperClient::new(Arc::new(DomainRateLimiter::new(Duration::from_millis(1))))
    }

    fn profile(content_pattern: &'static str) -> SourceProfile {
        SourceProfile {
            name: "marketwatch",
            domain: "marketwatch.com",
            url_template: "https://www.marketwatch.com/investing/stock/{symbol}",
            content_pattern,
        }
    }

    #[test]
    fn extracts_bounded_region_and_strips_tags() {
        let client = client();
        let profile = profile(r#"(?s)class="article__body"[^>]*>(.*?)<footer"#);
        let body = r#"<nav>downgrade everywhere in the nav</nav>
            <div class="article__body">Analysts <b>upgrade</b> the stock.</div>
            <footer>ignored boilerplate with lawsuit mentions</footer>"#;

        let extracted = client.extract_content(&profile, body);
        assert!(extracted.contains("upgrade"));
        assert!(!extracted.contains("downgrade"));
        assert!(!extracted.contains("lawsuit"));
        assert!(!extracted.contains('<'));
    }

    #[test]
    fn unmatched_pattern_falls_back_to_whole_body() {
        let client = client();
        let profile = profile(r#"(?s)class="no-such-region"[^>]*>(.*?)<footer"#);
        let body = "<p>bullish commentary</p>";

        let extracted = client.extract_content(&profile, body);
        assert!(extracted.contains("bullish"));
    }

    #[test]
    fn malformed_pattern_degrades_to_unscoped_extraction() {
        let client = client();
        let profile = profile(r#"(unterminated"#);
        let body = "<p>bearish commentary</p>";

        let extracted = client.extract_content(&profile, body);
        assert!(extracted.contains("bearish"));
    }
}

