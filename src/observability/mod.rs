use tracing::Span;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. JSON output is for machine collection;
/// the default compact layer is for terminals.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("SilverFeed=info,reqwest=warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

pub fn price_cycle_span(series: &str) -> Span {
    tracing::info_span!("price_cycle", series)
}
