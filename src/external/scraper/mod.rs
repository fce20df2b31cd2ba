pub mod client;
pub mod lexicon;
pub mod robots;

pub use client::{RawSentimentReading, ScrapeError, ScraperClient};
