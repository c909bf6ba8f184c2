use std::collections::HashMap;
use async_trait::async_trait;
use serde::Deserialize;
use crate::error::{Error, Result};
use crate::feed::fetchers::{QuoteFetcher, FETCH_TIMEOUT};

/// Metalprice quotes XAG per USD, so the spot price is the inverse rate.
pub struct MetalpriceApiFetcher {
    provider_id: &'static str,
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl MetalpriceApiFetcher {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String) -> Self {
        MetalpriceApiFetcher {
            provider_id: "metalpriceapi",
            client,
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl QuoteFetcher for MetalpriceApiFetcher {
    async fn fetch_spot(&self) -> Result<f64> {
        if self.api_key.is_empty() {
            return Err(Error::MissingCredential(self.provider_id));
        }

        let url = format!("{}/v1/latest", self.base_url.trim_end_matches('/'));
        let response = self.client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("base", "USD"),
                ("currencies", "XAG"),
            ])
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Transport {
                provider: self.provider_id,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::BadStatus {
                provider: self.provider_id,
                status: response.status().as_u16(),
            });
        }

        let payload: MetalpricePayload = response.json().await.map_err(|e| {
            Error::MalformedPayload {
                provider: self.provider_id,
                detail: e.to_string(),
            }
        })?;

        if payload.success == Some(false) {
            return Err(Error::EmptyQuote(self.provider_id));
        }

        let rate = payload
            .rates
            .as_ref()
            .and_then(|rates| rates.get("XAG"))
            .copied()
            .ok_or(Error::EmptyQuote(self.provider_id))?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::MalformedPayload {
                provider: self.provider_id,
                detail: format!("non-positive XAG rate: {rate}"),
            });
        }

        Ok(1.0 / rate)
    }

    fn provider_id(&self) -> &'static str {
        self.provider_id
    }
}

#[derive(Deserialize)]
struct MetalpricePayload {
    success: Option<bool>,
    rates: Option<HashMap<String, f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn inverts_the_xag_rate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("currencies", "XAG"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "base": "USD",
                "rates": { "XAG": 0.032 },
            })))
            .mount(&server)
            .await;

        let fetcher =
            MetalpriceApiFetcher::new(reqwest::Client::new(), "test-key".into(), server.uri());
        let price = fetcher.fetch_spot().await.unwrap();
        assert!((price - 31.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_rate_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "rates": {},
            })))
            .mount(&server)
            .await;

        let fetcher =
            MetalpriceApiFetcher::new(reqwest::Client::new(), "test-key".into(), server.uri());
        assert!(matches!(
            fetcher.fetch_spot().await,
            Err(Error::EmptyQuote("metalpriceapi"))
        ));
    }

    #[tokio::test]
    async fn zero_rate_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "rates": { "XAG": 0.0 },
            })))
            .mount(&server)
            .await;

        let fetcher =
            MetalpriceApiFetcher::new(reqwest::Client::new(), "test-key".into(), server.uri());
        assert!(matches!(
            fetcher.fetch_spot().await,
            Err(Error::MalformedPayload { .. })
        ));
    }
}
