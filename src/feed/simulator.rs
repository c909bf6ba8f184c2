use rand::{Rng, RngCore};
use crate::feed::ExchangeQuote;
use crate::types::exchange::Exchange;
use crate::types::timestamp::Timestamp;

/// Nominal contribution of each venue to the aggregate. Must sum to 1.0.
pub const EXCHANGE_PROFILES: [ExchangeProfile; 4] = [
    ExchangeProfile {
        exchange: Exchange::Lbma,
        weight: 0.40,
        base_multiplier: 1.0,
        jitter: 0.002,
    },
    ExchangeProfile {
        exchange: Exchange::Comex,
        weight: 0.30,
        base_multiplier: 1.0,
        jitter: 0.003,
    },
    // Shanghai carries a persistent physical-market premium over loco-London.
    ExchangeProfile {
        exchange: Exchange::Shanghai,
        weight: 0.20,
        base_multiplier: 1.02,
        jitter: 0.0025,
    },
    ExchangeProfile {
        exchange: Exchange::Other,
        weight: 0.10,
        base_multiplier: 1.0,
        jitter: 0.004,
    },
];

#[derive(Clone, Copy, Debug)]
pub struct ExchangeProfile {
    pub exchange: Exchange,
    pub weight: f64,
    pub base_multiplier: f64,
    pub jitter: f64,
}

/// Produce the four venue quotes for one aggregation cycle. Every quote is
/// marked active; outage modeling is not simulated here.
pub fn simulate_exchanges(
    base_price: f64,
    now: Timestamp,
    rng: &mut dyn RngCore,
) -> Vec<ExchangeQuote> {
    EXCHANGE_PROFILES
        .iter()
        .map(|profile| {
            let multiplier =
                profile.base_multiplier + rng.gen_range(-profile.jitter..=profile.jitter);
            ExchangeQuote {
                exchange: profile.exchange,
                price: base_price * multiplier,
                weight: profile.weight,
                active: true,
                observed_at: now,
            }
        })
        .collect()
}

/// Slowly drifting synthetic base price, used when no live quote is
/// available. The clamp keeps fully simulated aggregates inside the
/// plausible spot band.
#[derive(Clone, Debug)]
pub struct DriftingBaseline {
    value: f64,
}

impl DriftingBaseline {
    pub const INITIAL: f64 = 30.0;
    pub const MIN: f64 = 28.5;
    pub const MAX: f64 = 33.5;
    pub const MAX_STEP: f64 = 0.15;

    pub fn new() -> Self {
        DriftingBaseline {
            value: Self::INITIAL,
        }
    }

    pub fn tick(&mut self, rng: &mut dyn RngCore) -> f64 {
        let step = rng.gen_range(-Self::MAX_STEP..=Self::MAX_STEP);
        self.value = (self.value + step).clamp(Self::MIN, Self::MAX);
        self.value
    }
}

impl Default for DriftingBaseline {
    fn default() -> Self {
        Self::new()
    }
}
