use std::time::Duration;
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use crate::config::FeedConfig;
use crate::feed::aggregator::{exchange_breakdown, weighted_average};
use crate::feed::fetchers::{build_fetchers, QuoteFetcher};
use crate::feed::history::{append_and_trim, chart_series, range_metrics};
use crate::feed::simulator::{simulate_exchanges, DriftingBaseline};
use crate::feed::store::{
    load_record, save_record, KvStore, GLOBAL_SNAPSHOT_KEY, HISTORY_KEY, REGIONAL_SNAPSHOT_KEY,
};
use crate::feed::{AggregatePrice, PricePoint, Provenance, RegionalPrice, SimulationReason};
use crate::types::timestamp::Timestamp;

/// Persisted snapshots younger than this are reused without recomputation.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(30);

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(1_000);
const MAX_RETRY_EXPONENT: u32 = 3;

// Deltas reported before any previous aggregate exists in this session.
const PLACEHOLDER_CHANGE: f64 = 0.08;
const PLACEHOLDER_CHANGE_PERCENT: f64 = 0.25;

// Region-wide retail premium applied on top of the global aggregate. This
// is distinct from the SHANGHAI venue multiplier inside the aggregate; the
// two premiums compound.
const REGIONAL_PREMIUM_BASE: f64 = 1.02;
const REGIONAL_PREMIUM_SPREAD: f64 = 0.01;

/// The pricing context. Constructed once per session and handed by
/// reference to every consumer; all cache state lives here, not in
/// module-level globals.
///
/// The public operations never fail: every error inside the chain resolves
/// to the next source (fresh cache, live fetch, stale cache, simulation)
/// and the result carries its provenance.
pub struct PriceFeed {
    config: FeedConfig,
    store: Box<dyn KvStore>,
    fetchers: Vec<Box<dyn QuoteFetcher>>,
    rng: Box<dyn RngCore + Send>,
    baseline: DriftingBaseline,
    last_global: Option<AggregatePrice>,
    last_regional: Option<RegionalPrice>,
    retry_count: u32,
    global_in_flight: bool,
    regional_in_flight: bool,
}

impl PriceFeed {
    pub fn new(config: FeedConfig, store: Box<dyn KvStore>) -> Self {
        let fetchers = build_fetchers(&config);
        Self::with_parts(config, store, fetchers, Box::new(StdRng::from_entropy()))
    }

    /// Fully injected constructor; tests supply stub fetchers, a memory
    /// store and a seeded generator.
    pub fn with_parts(
        config: FeedConfig,
        store: Box<dyn KvStore>,
        fetchers: Vec<Box<dyn QuoteFetcher>>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        PriceFeed {
            config,
            store,
            fetchers,
            rng,
            baseline: DriftingBaseline::new(),
            last_global: None,
            last_regional: None,
            retry_count: 0,
            global_in_flight: false,
            regional_in_flight: false,
        }
    }

    /// Current global aggregate. Same-cycle calls inside the freshness
    /// window return the persisted snapshot verbatim.
    pub async fn global_price(&mut self) -> AggregatePrice {
        let now = Timestamp::now();

        if let Some(stored) =
            load_record::<AggregatePrice>(self.store.as_ref(), GLOBAL_SNAPSHOT_KEY)
        {
            if now - stored.observed_at < FRESHNESS_WINDOW {
                tracing::debug!(price = stored.price, "global freshness hit");
                return stored;
            }
        }

        if self.global_in_flight {
            return self.best_effort_global(now);
        }

        self.global_in_flight = true;
        let snapshot = self.compute_global(now).await;
        self.global_in_flight = false;
        snapshot
    }

    /// Current Shanghai price, derived from the resolved global aggregate
    /// with an independent cache.
    pub async fn regional_price(&mut self) -> RegionalPrice {
        let now = Timestamp::now();

        if let Some(stored) =
            load_record::<RegionalPrice>(self.store.as_ref(), REGIONAL_SNAPSHOT_KEY)
        {
            if now - stored.observed_at < FRESHNESS_WINDOW {
                tracing::debug!(price = stored.usd_price, "regional freshness hit");
                return stored;
            }
        }

        if self.regional_in_flight {
            return self.best_effort_regional(now);
        }

        self.regional_in_flight = true;
        let snapshot = self.compute_regional(now).await;
        self.regional_in_flight = false;
        snapshot
    }

    /// Hourly chart series ending at `current_price`. Synthesized; the
    /// rolling window only backs the 24h range metrics.
    pub fn history(&mut self, current_price: f64, points: usize) -> Vec<PricePoint> {
        chart_series(current_price, points, Timestamp::now(), self.rng.as_mut())
    }

    async fn compute_global(&mut self, now: Timestamp) -> AggregatePrice {
        if !self.config.live_enabled() || self.fetchers.is_empty() {
            let reason = if self.config.use_real_api {
                SimulationReason::NoCredentials
            } else {
                SimulationReason::ApiDisabled
            };
            let base = self.baseline.tick(self.rng.as_mut());
            return self.finish_global_cycle(base, Provenance::Simulated { reason }, now);
        }

        // All sources are consulted; the gate waits for every outcome
        // rather than racing to the first success.
        let outcomes = join_all(
            self.fetchers
                .iter()
                .map(|f| async move { (f.provider_id(), f.fetch_spot().await) }),
        )
        .await;

        let mut live = Vec::new();
        for (provider, outcome) in outcomes {
            match outcome {
                Ok(price) => {
                    tracing::debug!(provider, price, "live quote received");
                    live.push(price);
                }
                Err(e) => tracing::warn!(provider, error = %e, "quote fetch failed"),
            }
        }

        if !live.is_empty() {
            self.retry_count = 0;
            let base = live.iter().sum::<f64>() / live.len() as f64;
            return self.finish_global_cycle(base, Provenance::Live, now);
        }

        let delay = INITIAL_RETRY_DELAY * 2u32.pow(self.retry_count);
        self.retry_count = (self.retry_count + 1).min(MAX_RETRY_EXPONENT);
        tracing::warn!(
            retry_count = self.retry_count,
            delay_ms = delay.as_millis() as u64,
            "all quote sources failed, backing off"
        );
        tokio::time::sleep(delay).await;

        if let Some(stored) =
            load_record::<AggregatePrice>(self.store.as_ref(), GLOBAL_SNAPSHOT_KEY)
        {
            let age_ms = (now - stored.observed_at).as_millis() as u64;
            tracing::info!(age_ms, "serving stale persisted aggregate");
            return AggregatePrice {
                source: Provenance::Cached { age_ms },
                ..stored
            };
        }

        if let Some(last) = self.last_global.clone() {
            let age_ms = (now - last.observed_at).as_millis() as u64;
            return AggregatePrice {
                source: Provenance::Cached { age_ms },
                ..last
            };
        }

        let base = self.baseline.tick(self.rng.as_mut());
        let source = Provenance::Simulated {
            reason: SimulationReason::AllSourcesFailed,
        };
        self.finish_global_cycle(base, source, now)
    }

    /// One full aggregation cycle from a resolved base price: simulate the
    /// venues, aggregate, roll the history window, persist, supersede the
    /// in-memory last-good.
    fn finish_global_cycle(
        &mut self,
        base_price: f64,
        source: Provenance,
        now: Timestamp,
    ) -> AggregatePrice {
        let quotes = simulate_exchanges(base_price, now, self.rng.as_mut());
        let price = weighted_average(&quotes);

        let mut history: Vec<PricePoint> =
            load_record(self.store.as_ref(), HISTORY_KEY).unwrap_or_default();
        append_and_trim(
            &mut history,
            PricePoint {
                time: now,
                price,
                exchange_breakdown: Some(exchange_breakdown(&quotes)),
            },
        );
        let metrics = range_metrics(&history, self.rng.as_mut());

        let (change, change_percent) =
            deltas(price, self.last_global.as_ref().map(|s| s.price));

        let snapshot = AggregatePrice {
            price,
            change,
            change_percent,
            observed_at: now,
            high_24h: metrics.map(|m| m.high),
            low_24h: metrics.map(|m| m.low),
            volume_24h: metrics.map(|m| m.volume),
            exchanges: Some(quotes),
            source,
        };

        save_record(self.store.as_ref(), HISTORY_KEY, &history);
        save_record(self.store.as_ref(), GLOBAL_SNAPSHOT_KEY, &snapshot);
        self.last_global = Some(snapshot.clone());
        tracing::info!(
            price = snapshot.price,
            source = ?snapshot.source,
            "global aggregate updated"
        );
        snapshot
    }

    async fn compute_regional(&mut self, now: Timestamp) -> RegionalPrice {
        let global = self.global_price().await;
        let snapshot = self.derive_regional(&global, now);

        save_record(self.store.as_ref(), REGIONAL_SNAPSHOT_KEY, &snapshot);
        self.last_regional = Some(snapshot.clone());
        tracing::info!(
            price = snapshot.usd_price,
            premium = snapshot.premium_percent,
            "regional price updated"
        );
        snapshot
    }

    fn derive_regional(&mut self, global: &AggregatePrice, now: Timestamp) -> RegionalPrice {
        let premium = REGIONAL_PREMIUM_BASE + self.rng.gen_range(0.0..REGIONAL_PREMIUM_SPREAD);
        let usd_price = global.price * premium;
        let premium_percent =
            ((usd_price - global.price) / global.price * 100.0).max(0.0);

        let (change, change_percent) =
            deltas(usd_price, self.last_regional.as_ref().map(|s| s.usd_price));

        RegionalPrice {
            usd_price,
            change,
            change_percent,
            premium_percent,
            observed_at: now,
            source: global.source.clone(),
        }
    }

    /// Re-entered evaluation: hand back the freshest value already known
    /// instead of duplicating in-flight work.
    fn best_effort_global(&mut self, now: Timestamp) -> AggregatePrice {
        if let Some(last) = self.last_global.clone() {
            let age_ms = (now - last.observed_at).as_millis() as u64;
            return AggregatePrice {
                source: Provenance::Cached { age_ms },
                ..last
            };
        }

        if let Some(stored) =
            load_record::<AggregatePrice>(self.store.as_ref(), GLOBAL_SNAPSHOT_KEY)
        {
            let age_ms = (now - stored.observed_at).as_millis() as u64;
            return AggregatePrice {
                source: Provenance::Cached { age_ms },
                ..stored
            };
        }

        // Nothing cached anywhere; synthesize without persisting.
        let base = self.baseline.tick(self.rng.as_mut());
        let quotes = simulate_exchanges(base, now, self.rng.as_mut());
        let price = weighted_average(&quotes);
        let (change, change_percent) = deltas(price, None);
        AggregatePrice {
            price,
            change,
            change_percent,
            observed_at: now,
            high_24h: None,
            low_24h: None,
            volume_24h: None,
            exchanges: Some(quotes),
            source: Provenance::Simulated {
                reason: SimulationReason::AllSourcesFailed,
            },
        }
    }

    fn best_effort_regional(&mut self, now: Timestamp) -> RegionalPrice {
        if let Some(last) = self.last_regional.clone() {
            let age_ms = (now - last.observed_at).as_millis() as u64;
            return RegionalPrice {
                source: Provenance::Cached { age_ms },
                ..last
            };
        }

        if let Some(stored) =
            load_record::<RegionalPrice>(self.store.as_ref(), REGIONAL_SNAPSHOT_KEY)
        {
            let age_ms = (now - stored.observed_at).as_millis() as u64;
            return RegionalPrice {
                source: Provenance::Cached { age_ms },
                ..stored
            };
        }

        let global = self.best_effort_global(now);
        self.derive_regional(&global, now)
    }
}

fn deltas(current: f64, previous: Option<f64>) -> (f64, f64) {
    match previous {
        Some(prev) if prev > 0.0 => (current - prev, (current - prev) / prev * 100.0),
        _ => (PLACEHOLDER_CHANGE, PLACEHOLDER_CHANGE_PERCENT),
    }
}
