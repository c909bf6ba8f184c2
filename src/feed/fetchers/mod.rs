pub mod gold_api;
pub mod metalprice_api;

use std::time::Duration;
use async_trait::async_trait;
use crate::config::FeedConfig;
use crate::error::Result;

pub use gold_api::GoldApiFetcher;
pub use metalprice_api::MetalpriceApiFetcher;

/// Per-request timeout; a hung provider must not stall the whole cycle.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// A single remote spot-price source. Fetchers never retry internally;
/// any error means "absent, try the next source" to the caller.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    async fn fetch_spot(&self) -> Result<f64>;
    fn provider_id(&self) -> &'static str;
}

/// Build one fetcher per provider that has a credential configured.
pub fn build_fetchers(config: &FeedConfig) -> Vec<Box<dyn QuoteFetcher>> {
    let client = reqwest::Client::new();
    let mut fetchers: Vec<Box<dyn QuoteFetcher>> = Vec::new();

    if let Some(key) = &config.gold_api_key {
        fetchers.push(Box::new(GoldApiFetcher::new(
            client.clone(),
            key.clone(),
            config.gold_api_url.clone(),
        )));
    }
    if let Some(key) = &config.metal_price_api_key {
        fetchers.push(Box::new(MetalpriceApiFetcher::new(
            client.clone(),
            key.clone(),
            config.metal_price_api_url.clone(),
        )));
    }

    fetchers
}
