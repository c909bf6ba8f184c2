use std::collections::BTreeMap;
use crate::feed::ExchangeQuote;

/// Last-resort price when aggregation has nothing at all to work with.
pub const FALLBACK_SPOT_PRICE: f64 = 30.0;

/// Weight-normalized average over the active quotes.
///
/// Weights are renormalized over the active subset rather than held at
/// their nominal split, so partial data does not underweight the reported
/// price. With no active quotes the first quote's price is used, then the
/// fallback constant.
pub fn weighted_average(quotes: &[ExchangeQuote]) -> f64 {
    let active: Vec<&ExchangeQuote> = quotes.iter().filter(|q| q.active).collect();

    if active.is_empty() {
        return quotes.first().map(|q| q.price).unwrap_or(FALLBACK_SPOT_PRICE);
    }

    let total_weight: f64 = active.iter().map(|q| q.weight).sum();
    let weighted_sum: f64 = active.iter().map(|q| q.price * q.weight).sum();

    weighted_sum / total_weight
}

/// Per-venue price map attached to persisted history points.
pub fn exchange_breakdown(quotes: &[ExchangeQuote]) -> BTreeMap<String, f64> {
    quotes
        .iter()
        .map(|q| (q.exchange.as_str().to_string(), q.price))
        .collect()
}
