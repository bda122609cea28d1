use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::{
    error::{Result, WeatherError},
    model::Location,
};

use super::Transport;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const UNITS: &str = "metric";

/// HTTP transport for the OpenWeather current-weather endpoint.
///
/// Holds one `reqwest::Client` for the lifetime of the process so repeated
/// calls reuse the connection.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WeatherError::Config("API key must be provided".to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    /// Point the client at another server, e.g. a mock in tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for OpenWeatherClient {
    async fn current_weather(&self, location: &Location) -> Result<String> {
        let url = format!("{}/weather", self.base_url);

        let mut query = location.query_params();
        query.push(("appid", self.api_key.clone()));
        query.push(("units", UNITS.to_string()));

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                WeatherError::Network(format!("Failed to send request to OpenWeather: {e}"))
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| {
                WeatherError::Network(format!("Failed to read OpenWeather response body: {e}"))
            })?;

        if !status.is_success() {
            tracing::debug!("OpenWeather answered {status} for {location}");
            return Err(WeatherError::Provider {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let err = OpenWeatherClient::new("  ", DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, WeatherError::Config(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = OpenWeatherClient::new("KEY", DEFAULT_TIMEOUT)
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(300);
        let short = truncate_body(&body);
        assert_eq!(short.chars().count(), 203);
        assert!(short.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
