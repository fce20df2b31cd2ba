use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Signal;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction model unavailable: {0}")]
    Unavailable(String),
}

/// One model output for a single stock.
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub signal: Signal,
    pub confidence: f64,
}

/// Port to the model that turns a stock's recent market data and aggregated
/// sentiment into a trading signal. Training and feature engineering live
/// entirely on the other side of this trait; this crate only consumes it.
#[async_trait]
pub trait PredictionModel: Send + Sync {
    async fn predict(
        &self,
        symbol: &str,
        sentiment_score: f64,
    ) -> Result<Prediction, PredictionError>;
}

/// Deterministic stand-in for the real model, used only so `main.rs` is
/// runnable standalone without a live inference service wired up. Never
/// used outside the `stub-prediction` feature; a real deployment supplies
/// its own `PredictionModel`.
#[cfg(feature = "stub-prediction")]
pub struct StubPredictionModel;

#[cfg(feature = "stub-prediction")]
#[async_trait]
impl PredictionModel for StubPredictionModel {
    async fn predict(
        &self,
        _symbol: &str,
        sentiment_score: f64,
    ) -> Result<Prediction, PredictionError> {
        let signal = if sentiment_score > 0.15 {
            Signal::Buy
        } else if sentiment_score < -0.15 {
            Signal::Sell
        } else {
            Signal::Hold
        };

        Ok(Prediction {
            signal,
            confidence: 0.5 + sentiment_score.abs().min(0.4),
        })
    }
}
