use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::RawMarketPoint;
use crate::services::rate_limiter::DomainRateLimiter;

/// Domain the rate limiter's spacing budget is tracked against. Alpha
/// Vantage's free tier is the documented 5-calls/minute quota this spacing
/// is tuned for.
const PROVIDER_DOMAIN: &str = "alphavantage.co";

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("server error {0}")]
    ServerError(u16),

    #[error("ticker not found")]
    NotFound,
}

/// Port to the external price/volume quote API. A single call returns the
/// latest tradable quote for one symbol; batching across symbols is the
/// caller's job, not the provider's.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawMarketPoint, MarketDataError>;
}

pub struct HttpMarketDataProvider {
    client: reqwest::Client,
    api_key: String,
    rate_limiter: Arc<DomainRateLimiter>,
}

impl HttpMarketDataProvider {
    pub fn new(api_key: String, rate_limiter: Arc<DomainRateLimiter>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            rate_limiter,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
}

#[async_trait]
impl MarketDataProvider for HttpMarketDataProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawMarketPoint, MarketDataError> {
        let url = "https://www.alphavantage.co/query";

        self.rate_limiter.wait(PROVIDER_DOMAIN).await;

        let resp = self
            .client
            .get(url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(MarketDataError::RateLimited);
        }
        if status.is_server_error() {
            return Err(MarketDataError::ServerError(status.as_u16()));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(MarketDataError::BadResponse(format!(
                "status {}: {}",
                status.as_u16(),
                text
            )));
        }

        let body: QuoteResponse = resp
            .json()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        if body.note.is_some() {
            return Err(MarketDataError::RateLimited);
        }

        if let Some(msg) = body.error_message {
            return Err(MarketDataError::BadResponse(msg));
        }

        let quote = body
            .global_quote
            .filter(|q| !q.price.is_empty())
            .ok_or(MarketDataError::NotFound)?;

        let price: BigDecimal = quote
            .price
            .parse()
            .map_err(|_| MarketDataError::Parse(format!("bad price: {}", quote.price)))?;
        let volume: i64 = quote
            .volume
            .parse()
            .map_err(|_| MarketDataError::Parse(format!("bad volume: {}", quote.volume)))?;

        Ok(RawMarketPoint {
            price,
            volume,
            observed_at: Utc::now(),
        })
    }
}
