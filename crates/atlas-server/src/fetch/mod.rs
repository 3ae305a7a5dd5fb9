//! Upstream client for the country list and exchange-rate sources

use atlas_core::{AtlasError, Result};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One upstream country entry, restcountries v2 shape.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCountry {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub population: i64,
    pub flag: Option<String>,
    pub flags: Option<FlagLinks>,
    #[serde(default)]
    pub currencies: Vec<UpstreamCurrency>,
}

impl UpstreamCountry {
    /// Prefer the direct `flag` field, fall back to `flags.png`.
    pub fn flag_url(&self) -> Option<String> {
        self.flag
            .clone()
            .or_else(|| self.flags.as_ref().and_then(|f| f.png.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagLinks {
    pub png: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCurrency {
    pub code: Option<String>,
}

/// Envelope of the exchange-rate source; everything but `rates` is ignored.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

pub struct UpstreamClient {
    http: ReqwestClient,
    countries_url: String,
    rates_url: String,
}

impl UpstreamClient {
    pub fn new(countries_url: String, rates_url: String) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AtlasError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            countries_url,
            rates_url,
        })
    }

    /// Read both sources, country list first. Either read failing,
    /// for any transport or status reason, fails the whole fetch.
    pub async fn fetch(&self) -> Result<(Vec<UpstreamCountry>, HashMap<String, f64>)> {
        let countries: Vec<UpstreamCountry> = self.get_json(&self.countries_url).await?;
        let rates: RatesResponse = self.get_json(&self.rates_url).await?;

        tracing::info!(
            "Fetched {} countries and {} exchange rates",
            countries.len(),
            rates.rates.len()
        );

        Ok((countries, rates.rates))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).send().await.map_err(|e| {
            tracing::warn!("Upstream request to {} failed: {}", url, e);
            AtlasError::UpstreamUnavailable
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Upstream {} returned status {}", url, status);
            return Err(AtlasError::UpstreamUnavailable);
        }

        // A body that is not valid JSON is an internal error, not an
        // availability problem.
        response
            .json::<T>()
            .await
            .map_err(|e| AtlasError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_decoding_with_flag_fallback() {
        let body = r#"
        [
            {
                "name": "Nigeria",
                "capital": "Abuja",
                "region": "Africa",
                "population": 206139589,
                "flag": "https://flagcdn.com/ng.svg",
                "currencies": [{"code": "NGN", "name": "Nigerian naira", "symbol": "N"}]
            },
            {
                "name": "Atlantis",
                "flags": {"png": "https://flagcdn.com/w320/at.png"},
                "currencies": []
            }
        ]
        "#;

        let countries: Vec<UpstreamCountry> = serde_json::from_str(body).unwrap();
        assert_eq!(countries.len(), 2);

        assert_eq!(countries[0].flag_url().as_deref(), Some("https://flagcdn.com/ng.svg"));
        assert_eq!(countries[0].currencies[0].code.as_deref(), Some("NGN"));

        // Missing population decodes to 0, flags.png is the fallback.
        assert_eq!(countries[1].population, 0);
        assert_eq!(
            countries[1].flag_url().as_deref(),
            Some("https://flagcdn.com/w320/at.png")
        );
        assert!(countries[1].currencies.is_empty());
    }

    #[test]
    fn test_rates_decoding_ignores_envelope_fields() {
        let body = r#"
        {
            "result": "success",
            "base_code": "USD",
            "time_last_update_utc": "Fri, 27 Jun 2025 00:02:31 +0000",
            "rates": {"USD": 1.0, "EUR": 0.85, "NGN": 1541.2}
        }
        "#;

        let parsed: RatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.rates.len(), 3);
        assert_eq!(parsed.rates.get("EUR"), Some(&0.85));
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_upstream_unavailable() {
        // Nothing listens on port 9; the connection is refused.
        let client = UpstreamClient::new(
            "http://127.0.0.1:9/all".to_string(),
            "http://127.0.0.1:9/latest/USD".to_string(),
        )
        .unwrap();

        match client.fetch().await {
            Err(AtlasError::UpstreamUnavailable) => {}
            other => panic!("expected UpstreamUnavailable, got {:?}", other.map(|_| ())),
        }
    }
}
