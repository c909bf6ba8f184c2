use async_trait::async_trait;
use serde::Deserialize;
use crate::error::{Error, Result};
use crate::feed::fetchers::{QuoteFetcher, FETCH_TIMEOUT};

pub struct GoldApiFetcher {
    provider_id: &'static str,
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoldApiFetcher {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String) -> Self {
        GoldApiFetcher {
            provider_id: "goldapi",
            client,
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl QuoteFetcher for GoldApiFetcher {
    async fn fetch_spot(&self) -> Result<f64> {
        if self.api_key.is_empty() {
            return Err(Error::MissingCredential(self.provider_id));
        }

        let url = format!("{}/XAG/USD", self.base_url.trim_end_matches('/'));
        let response = self.client
            .get(&url)
            .header("x-access-token", &self.api_key)
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

        let payload: GoldApiPayload = response.json().await.map_err(|e| {
            Error::MalformedPayload {
                provider: self.provider_id,
                detail: e.to_string(),
            }
        })?;

        match payload.price {
            Some(price) if price.is_finite() && price > 0.0 => Ok(price),
            _ => Err(Error::EmptyQuote(self.provider_id)),
        }
    }

    fn provider_id(&self) -> &'static str {
        self.provider_id
    }
}

#[derive(Deserialize)]
struct GoldApiPayload {
    price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_spot_price_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/XAG/USD"))
            .and(header("x-access-token", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metal": "XAG",
                "currency": "USD",
                "price": 31.42,
            })))
            .mount(&server)
            .await;

        let fetcher =
            GoldApiFetcher::new(reqwest::Client::new(), "test-key".into(), server.uri());
        let price = fetcher.fetch_spot().await.unwrap();
        assert_eq!(price, 31.42);
    }

    #[tokio::test]
    async fn non_2xx_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/XAG/USD"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher =
            GoldApiFetcher::new(reqwest::Client::new(), "test-key".into(), server.uri());
        assert!(matches!(
            fetcher.fetch_spot().await,
            Err(Error::BadStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/XAG/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetcher =
            GoldApiFetcher::new(reqwest::Client::new(), "test-key".into(), server.uri());
        assert!(matches!(
            fetcher.fetch_spot().await,
            Err(Error::MalformedPayload { .. })
        ));
    }

    #[tokio::test]
    async fn empty_credential_is_rejected_before_any_request() {
        let fetcher = GoldApiFetcher::new(
            reqwest::Client::new(),
            String::new(),
            "http://127.0.0.1:1".into(),
        );
        assert!(matches!(
            fetcher.fetch_spot().await,
            Err(Error::MissingCredential("goldapi"))
        ));
    }
}
