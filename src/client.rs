use anyhow::Result;
use reqwest::{header::ACCEPT, Client};

use crate::config::WeatherConfig;
use crate::constants::GEO_JSON;
use crate::error::FetchError;
use crate::models::Payload;

/// Thin reader for the NWS API.
#[derive(Debug, Clone)]
pub struct NwsClient {
    http: Client,
    api_base: String,
}

impl NwsClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
        })
    }

    pub fn alerts_url(&self, state: &str) -> String {
        format!("{}/alerts/active/area/{}", self.api_base, state)
    }

    pub fn points_url(&self, latitude: f64, longitude: f64) -> String {
        format!("{}/points/{},{}", self.api_base, latitude, longitude)
    }

    /// Issues a single GET against `url` and decodes the body as a JSON object.
    ///
    /// No retries. Transport errors, non-2xx statuses and undecodable bodies are
    /// reported through [`FetchError`].
    pub async fn fetch(&self, url: &str) -> Result<Payload, FetchError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, GEO_JSON)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let payload = response
            .json::<Payload>()
            .await
            .map_err(FetchError::Decode)?;
        tracing::debug!(url, "fetched provider payload");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> NwsClient {
        NwsClient::new(&WeatherConfig {
            api_base: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn alerts_url_substitutes_state_verbatim() {
        let c = client("https://api.weather.gov");
        assert_eq!(
            c.alerts_url("CA"),
            "https://api.weather.gov/alerts/active/area/CA"
        );
        assert_eq!(
            c.alerts_url("not-a-state"),
            "https://api.weather.gov/alerts/active/area/not-a-state"
        );
    }

    #[test]
    fn points_url_uses_lat_lon_pair() {
        let c = client("https://api.weather.gov");
        assert_eq!(
            c.points_url(39.7456, -97.0892),
            "https://api.weather.gov/points/39.7456,-97.0892"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let c = client("http://127.0.0.1:9");
        let err = c.fetch(&c.alerts_url("CA")).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
