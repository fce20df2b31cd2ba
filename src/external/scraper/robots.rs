use std::time::Duration;

use tracing::warn;

/// Parsed subset of a `robots.txt` that this crawler honors: path prefixes
/// disallowed for `User-agent: *`, and an optional `Crawl-delay`. Anything
/// else in the file (sitemaps, other user-agent blocks) is ignored.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    disallowed_prefixes: Vec<String>,
    pub crawl_delay: Option<Duration>,
}

impl RobotsPolicy {
    pub fn allows(&self, path: &str) -> bool {
        !self
            .disallowed_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Permissive default used when `robots.txt` cannot be fetched or
    /// parsed. A missing or unreachable `robots.txt` is not a reason to
    /// block the crawl.
    pub fn permissive() -> Self {
        Self::default()
    }
}

/// Parses the generic (`User-agent: *`) block of a `robots.txt` body.
pub fn parse(body: &str) -> RobotsPolicy {
    let mut disallowed_prefixes = Vec::new();
    let mut crawl_delay = None;
    let mut in_wildcard_block = false;

    for raw_line in body.lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                in_wildcard_block = value == "*";
            }
            "disallow" if in_wildcard_block && !value.is_empty() => {
                disallowed_prefixes.push(value.to_string());
            }
            "crawl-delay" if in_wildcard_block => {
                if let Ok(secs) = value.parse::<f64>() {
                    crawl_delay = Some(Duration::from_secs_f64(secs));
                }
            }
            _ => {}
        }
    }

    RobotsPolicy {
        disallowed_prefixes,
        crawl_delay,
    }
}

/// Fetches and parses `https://{domain}/robots.txt`. Network failures and
/// non-200 responses both fall back to `RobotsPolicy::permissive()` — a
/// source that has no published policy is treated as unrestricted, per the
/// scraper's robots-compliance contract.
pub async fn fetch(client: &reqwest::Client, domain: &str) -> RobotsPolicy {
    let url = format!("https://{domain}/robots.txt");

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(body) => parse(&body),
            Err(e) => {
                warn!("failed reading robots.txt body for {}: {}", domain, e);
                RobotsPolicy::permissive()
            }
        },
        Ok(resp) => {
            warn!("robots.txt for {} returned {}", domain, resp.status());
            RobotsPolicy::permissive()
        }
        Err(e) => {
            warn!("failed fetching robots.txt for {}: {}", domain, e);
            RobotsPolicy::permissive()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_disallow_and_crawl_delay_for_wildcard_agent() {
        let body = "User-agent: *\nDisallow: /private\nCrawl-delay: 5\n\nUser-agent: Googlebot\nDisallow: /\n";
        let policy = parse(body);
        assert!(!policy.allows("/private/page"));
        assert!(policy.allows("/public"));
        assert_eq!(policy.crawl_delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn ignores_other_agent_blocks() {
        let body = "User-agent: Googlebot\nDisallow: /\n";
        let policy = parse(body);
        assert!(policy.allows("/anything"));
    }

    #[test]
    fn permissive_allows_everything() {
        let policy = RobotsPolicy::permissive();
        assert!(policy.allows("/whatever"));
        assert!(policy.crawl_delay.is_none());
    }
}
