pub mod loader;

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Master switch for live fetching. Without at least one credential
    /// the feed runs simulated regardless of this flag.
    pub use_real_api: bool,
    pub gold_api_key: Option<String>,
    pub metal_price_api_key: Option<String>,
    pub gold_api_url: String,
    pub metal_price_api_url: String,
    pub poll_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            use_real_api: false,
            gold_api_key: None,
            metal_price_api_key: None,
            gold_api_url: "https://www.goldapi.io/api".to_string(),
            metal_price_api_url: "https://api.metalpriceapi.com".to_string(),
            poll_interval_secs: 60,
        }
    }
}

impl FeedConfig {
    pub fn has_credentials(&self) -> bool {
        let usable = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.is_empty());
        usable(&self.gold_api_key) || usable(&self.metal_price_api_key)
    }

    pub fn live_enabled(&self) -> bool {
        self.use_real_api && self.has_credentials()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            dir: PathBuf::from("data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_credentials_disables_live_mode_even_when_flagged_on() {
        let config = FeedConfig {
            use_real_api: true,
            ..FeedConfig::default()
        };
        assert!(!config.live_enabled());
    }

    #[test]
    fn empty_credential_counts_as_absent() {
        let config = FeedConfig {
            use_real_api: true,
            gold_api_key: Some(String::new()),
            ..FeedConfig::default()
        };
        assert!(!config.has_credentials());
        assert!(!config.live_enabled());
    }

    #[test]
    fn one_credential_is_enough() {
        let config = FeedConfig {
            use_real_api: true,
            metal_price_api_key: Some("key".to_string()),
            ..FeedConfig::default()
        };
        assert!(config.live_enabled());
    }
}
