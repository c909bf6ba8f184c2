pub mod config;
pub mod error;
pub mod feed;
pub mod observability;
pub mod types;
pub mod utils;

pub use feed::service::PriceFeed;
