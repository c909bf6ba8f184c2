use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{info, Instrument};
use SilverFeed::config::loader::AppConfig;
use SilverFeed::feed::store::JsonFileStore;
use SilverFeed::observability;
use SilverFeed::PriceFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("SILVERFEED_ENV").unwrap_or_else(|_| "default".to_string());
    let config = AppConfig::load(&env).context("failed to load configuration")?;

    observability::init(std::env::var("SILVERFEED_LOG_JSON").is_ok());

    let store = JsonFileStore::new(&config.storage.dir)
        .context("failed to open the snapshot store")?;
    let poll_interval = Duration::from_secs(config.feed.poll_interval_secs.max(1));
    let feed = Arc::new(Mutex::new(PriceFeed::new(config.feed, Box::new(store))));

    info!(interval = ?poll_interval, "SilverFeed started");

    let global_feed = Arc::clone(&feed);
    let global_loop = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            let snapshot = async { global_feed.lock().await.global_price().await }
                .instrument(observability::price_cycle_span("global"))
                .await;
            info!(
                price = snapshot.price,
                change = snapshot.change,
                source = ?snapshot.source,
                "global spot"
            );
        }
    });

    let regional_feed = Arc::clone(&feed);
    let regional_loop = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            let snapshot = async { regional_feed.lock().await.regional_price().await }
                .instrument(observability::price_cycle_span("shanghai"))
                .await;
            info!(
                price = snapshot.usd_price,
                premium = snapshot.premium_percent,
                source = ?snapshot.source,
                "shanghai spot"
            );
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the shutdown signal")?;
    info!("shutdown signal received, stopping pollers");
    global_loop.abort();
    regional_loop.abort();

    Ok(())
}
