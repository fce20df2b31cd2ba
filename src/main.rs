mod clock;
mod config;
mod db;
mod domain;
mod errors;
mod external;
mod jobs;
mod logging;
mod services;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use clock::SystemClock;
use config::Config;
use external::market_data_provider::HttpMarketDataProvider;
use external::scraper::ScraperClient;
use logging::LoggingConfig;
use services::rate_limiter::DomainRateLimiter;
use services::scheduler::{JobContext, Scheduler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(LoggingConfig::from_env())?;

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let rate_limiter = Arc::new(
        DomainRateLimiter::new(config.default_scrape_spacing)
            .with_override("alphavantage.co", config.market_data_min_spacing()),
    );

    let market_data_provider: Arc<dyn external::market_data_provider::MarketDataProvider> =
        Arc::new(HttpMarketDataProvider::new(
            config.market_data_api_key.clone(),
            rate_limiter.clone(),
        ));

    let scraper_client = Arc::new(ScraperClient::new(rate_limiter.clone()));

    let prediction_model: Arc<dyn external::prediction_port::PredictionModel> = build_prediction_model();

    let context = JobContext {
        pool: Arc::new(pool),
        market_data_provider,
        scraper_client,
        prediction_model,
        config: Arc::new(config),
        clock: Arc::new(SystemClock),
    };

    let mut scheduler = Scheduler::new(context).await?;
    scheduler.start().await?;

    tracing::info!("scheduler started; awaiting shutdown signal");
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    scheduler.shutdown().await?;

    Ok(())
}

#[cfg(feature = "stub-prediction")]
fn build_prediction_model() -> Arc<dyn external::prediction_port::PredictionModel> {
    Arc::new(external::prediction_port::StubPredictionModel)
}

#[cfg(not(feature = "stub-prediction"))]
fn build_prediction_model() -> Arc<dyn external::prediction_port::PredictionModel> {
    panic!(
        "no PredictionModel wired up: enable the `stub-prediction` feature for local \
         experimentation, or supply a real model before running this binary"
    );
}
