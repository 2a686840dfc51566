use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::rates::{ExchangeRateTable, FiatRateProvider};

/// Latest fiat rates from a freecurrencyapi-compatible service.
pub struct FreeCurrencyProvider {
    base_url: String,
    api_key: Option<String>,
}

impl FreeCurrencyProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        FreeCurrencyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

// Providers disagree on the envelope key
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LatestRatesResponse {
    Data { data: ExchangeRateTable },
    Rates { rates: ExchangeRateTable },
}

impl LatestRatesResponse {
    fn into_table(self) -> ExchangeRateTable {
        match self {
            LatestRatesResponse::Data { data } => data,
            LatestRatesResponse::Rates { rates } => rates,
        }
    }
}

#[async_trait]
impl FiatRateProvider for FreeCurrencyProvider {
    #[instrument(name = "FiatRatesFetch", skip(self))]
    async fn fetch_fiat_rates(&self) -> Result<ExchangeRateTable> {
        let endpoint = format!("{}/v1/latest", self.base_url);
        debug!("Requesting exchange rates from {}", endpoint);

        // The key goes on the query string; never log the full URL
        let url = match &self.api_key {
            Some(key) => reqwest::Url::parse_with_params(&endpoint, &[("apikey", key)]),
            None => {
                debug!("No fiat API key configured, sending anonymous request");
                reqwest::Url::parse(&endpoint)
            }
        }
        .map_err(|e| anyhow!("Invalid exchange rates URL {}: {}", endpoint, e))?;

        let client = reqwest::Client::builder().user_agent("tradex/1.0").build()?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "Request error: {} for exchange rates URL: {}",
                    e.without_url(),
                    endpoint
                )
            })?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for exchange rates",
                response.status()
            ));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse exchange rates response: {}", e))?;

        Ok(data.into_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_data_envelope() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            200,
            r#"{"data": {"SGD": 1.34, "USD": 1.0, "RUB": 92.5}}"#,
        )
        .await;

        let provider = FreeCurrencyProvider::new(&mock_server.uri(), None);
        let table = provider.fetch_fiat_rates().await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table["SGD"], 1.34);
        assert_eq!(table["RUB"], 92.5);
    }

    #[tokio::test]
    async fn test_rates_envelope() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, 200, r#"{"base": "USD", "rates": {"EUR": 0.92}}"#).await;

        let provider = FreeCurrencyProvider::new(&mock_server.uri(), None);
        let table = provider.fetch_fiat_rates().await.unwrap();
        assert_eq!(table["EUR"], 0.92);
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("apikey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": {"SGD": 1.3}}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = FreeCurrencyProvider::new(&mock_server.uri(), Some("secret".to_string()));
        let table = provider.fetch_fiat_rates().await.unwrap();
        assert_eq!(table["SGD"], 1.3);
    }

    #[tokio::test]
    async fn test_api_key_with_reserved_characters() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("apikey", "ab&c+d=e#f%g"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": {"EUR": 0.9}}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            FreeCurrencyProvider::new(&mock_server.uri(), Some("ab&c+d=e#f%g".to_string()));
        let table = provider.fetch_fiat_rates().await.unwrap();
        assert_eq!(table["EUR"], 0.9);
    }

    #[tokio::test]
    async fn test_http_error() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, 429, "").await;

        let provider = FreeCurrencyProvider::new(&mock_server.uri(), None);
        let result = provider.fetch_fiat_rates().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 429 Too Many Requests for exchange rates"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, 200, r#"{"quotes": {}}"#).await;

        let provider = FreeCurrencyProvider::new(&mock_server.uri(), None);
        let result = provider.fetch_fiat_rates().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse exchange rates response")
        );
    }
}
