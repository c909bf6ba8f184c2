use std::time::Duration;
use rand::{Rng, RngCore};
use crate::feed::PricePoint;
use crate::types::timestamp::Timestamp;
use crate::utils::helper::round_cents;

/// Retention horizon for the rolling window.
pub const HISTORY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Spacing of synthesized chart points.
pub const CHART_STEP: Duration = Duration::from_secs(60 * 60);

/// Maximum per-step drift of the synthesized backward walk.
const CHART_DRIFT: f64 = 0.006;

/// Scale constant for the synthetic volume figure. Not a real traded
/// volume; it only tracks the width of the 24h range.
const VOLUME_SCALE: f64 = 850_000.0;
const VOLUME_JITTER: f64 = 0.1;

/// Drop everything older than the window, measured from the new point,
/// then append it. Point count is unbounded within the window; the poll
/// cadence keeps it small in practice.
pub fn append_and_trim(history: &mut Vec<PricePoint>, point: PricePoint) {
    history.retain(|p| point.time - p.time <= HISTORY_WINDOW);
    history.push(point);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeMetrics {
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

/// High/low over the retained window plus the synthetic volume figure.
pub fn range_metrics(history: &[PricePoint], rng: &mut dyn RngCore) -> Option<RangeMetrics> {
    if history.is_empty() {
        return None;
    }

    let high = history.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    let low = history.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);

    let jitter = rng.gen_range(-VOLUME_JITTER..=VOLUME_JITTER);
    let volume = (high - low) / low * VOLUME_SCALE * (1.0 + jitter);

    Some(RangeMetrics { high, low, volume })
}

/// Synthesize exactly `points` hourly observations ending at `now`, the
/// last of which carries `current_price` unchanged. Earlier prices walk
/// backwards with bounded random drift, rounded to cents.
pub fn chart_series(
    current_price: f64,
    points: usize,
    now: Timestamp,
    rng: &mut dyn RngCore,
) -> Vec<PricePoint> {
    if points == 0 {
        return Vec::new();
    }

    let mut prices = vec![current_price; points];
    for i in (0..points - 1).rev() {
        let drift = rng.gen_range(-CHART_DRIFT..=CHART_DRIFT);
        prices[i] = round_cents(prices[i + 1] * (1.0 + drift));
    }

    prices
        .into_iter()
        .enumerate()
        .map(|(i, price)| PricePoint {
            time: now - CHART_STEP * (points - 1 - i) as u32,
            price,
            exchange_breakdown: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn point(hours_ago: u64, price: f64, newest: Timestamp) -> PricePoint {
        PricePoint {
            time: newest - Duration::from_secs(hours_ago * 3600),
            price,
            exchange_breakdown: None,
        }
    }

    #[test]
    fn trims_points_older_than_24h_from_newest() {
        let newest = Timestamp::from_millis(40 * 3600 * 1000);
        let mut history: Vec<PricePoint> =
            (1..=30).map(|h| point(31 - h, 30.0 + h as f64 * 0.01, newest)).collect();

        append_and_trim(&mut history, point(0, 31.0, newest));

        assert!(!history.is_empty());
        for p in &history {
            assert!(newest - p.time <= HISTORY_WINDOW);
        }
        assert_eq!(history.last().unwrap().price, 31.0);
    }

    #[test]
    fn keeps_everything_inside_the_window() {
        let newest = Timestamp::from_millis(48 * 3600 * 1000);
        let mut history: Vec<PricePoint> =
            (1..=12).map(|h| point(h, 30.0, newest)).collect();

        append_and_trim(&mut history, point(0, 30.5, newest));
        assert_eq!(history.len(), 13);
    }

    #[test]
    fn range_metrics_track_high_and_low() {
        let newest = Timestamp::from_millis(30 * 3600 * 1000);
        let history = vec![
            point(3, 29.4, newest),
            point(2, 31.8, newest),
            point(1, 30.1, newest),
        ];

        let mut rng = StdRng::seed_from_u64(11);
        let metrics = range_metrics(&history, &mut rng).unwrap();
        assert_eq!(metrics.high, 31.8);
        assert_eq!(metrics.low, 29.4);
        assert!(metrics.volume >= 0.0);

        let nominal = (31.8 - 29.4) / 29.4 * 850_000.0;
        assert!(metrics.volume >= nominal * 0.9 && metrics.volume <= nominal * 1.1);
    }

    #[test]
    fn range_metrics_need_at_least_one_point() {
        let mut rng = StdRng::seed_from_u64(11);
        assert!(range_metrics(&[], &mut rng).is_none());
    }

    #[test]
    fn chart_series_ends_exactly_at_current_price() {
        let mut rng = StdRng::seed_from_u64(5);
        let now = Timestamp::from_millis(100 * 3600 * 1000);
        let series = chart_series(30.00, 24, now, &mut rng);

        assert_eq!(series.len(), 24);
        assert_eq!(series.last().unwrap().price, 30.00);
        assert_eq!(series.last().unwrap().time, now);

        for pair in series.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, CHART_STEP);
            assert!(pair[0].price > 0.0);
        }
    }

    #[test]
    fn chart_series_zero_points_is_empty() {
        let mut rng = StdRng::seed_from_u64(5);
        let now = Timestamp::from_millis(1000);
        assert!(chart_series(30.0, 0, now, &mut rng).is_empty());
    }
}
