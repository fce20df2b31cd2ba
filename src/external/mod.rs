pub mod market_data_provider;
pub mod prediction_port;
pub mod scraper;
