pub mod aggregator;
pub mod fetchers;
pub mod history;
pub mod service;
pub mod simulator;
pub mod store;

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::types::exchange::Exchange;
use crate::types::timestamp::Timestamp;

/// Where a returned price came from. Consumers surface anything other
/// than `Live` as a non-blocking advisory, never as an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Cached { age_ms: u64 },
    Simulated { reason: SimulationReason },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationReason {
    ApiDisabled,
    NoCredentials,
    AllSourcesFailed,
}

/// One synthetic per-venue quote. Recomputed on every aggregation cycle,
/// never persisted individually.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeQuote {
    pub exchange: Exchange,
    pub price: f64,
    pub weight: f64,
    pub active: bool,
    pub observed_at: Timestamp,
}

/// One aggregate observation retained in the rolling 24h window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: Timestamp,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_breakdown: Option<BTreeMap<String, f64>>,
}

/// The global aggregate snapshot. Superseded by the next cycle, never
/// mutated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatePrice {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub observed_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchanges: Option<Vec<ExchangeQuote>>,
    pub source: Provenance,
}

/// The Shanghai series, derived from a resolved global aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionalPrice {
    pub usd_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub premium_percent: f64,
    pub observed_at: Timestamp,
    pub source: Provenance,
}
