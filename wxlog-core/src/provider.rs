use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Debug;

use crate::{
    Config, WeatherRecord,
    error::Result,
    model::Location,
    normalize::normalize,
    provider::openweather::OpenWeatherClient,
    retry::{RetryPolicy, Sleeper, TokioSleeper},
};

pub mod openweather;

/// One GET against the provider's current-weather endpoint.
///
/// Implementations return the response body on a 2xx status and a classified
/// [`WeatherError`](crate::WeatherError) otherwise: `Network` for transport
/// failures, `Provider` for non-2xx statuses.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn current_weather(&self, location: &Location) -> Result<String>;
}

/// Fetches and normalizes current weather, retrying transient failures.
#[derive(Debug)]
pub struct Fetcher<T: Transport> {
    transport: T,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            sleeper: Box::new(TokioSleeper),
        }
    }

    /// Replace how the fetcher waits between attempts.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch_by_city(&self, city: &str, country: Option<&str>) -> Result<WeatherRecord> {
        self.fetch(&Location::city(city, country)).await
    }

    pub async fn fetch_by_coords(&self, lat: f64, lon: f64) -> Result<WeatherRecord> {
        self.fetch(&Location::Coords { lat, lon }).await
    }

    pub async fn fetch(&self, location: &Location) -> Result<WeatherRecord> {
        tracing::info!("Fetching weather for {location}");

        let transport = &self.transport;
        let sleeper = self.sleeper.as_ref();
        let label = format!("weather request for {location}");
        let body = self
            .retry
            .run(sleeper, &label, move || transport.current_weather(location))
            .await?;

        normalize(&body, Utc::now())
    }
}

/// Build a fetcher backed by OpenWeather from the loaded configuration.
pub fn fetcher_from_config(config: &Config) -> anyhow::Result<Fetcher<OpenWeatherClient>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `wxlog configure` or set OPENWEATHER_KEY."
        )
    })?;

    let client = OpenWeatherClient::new(api_key, config.provider.timeout())?
        .with_base_url(&config.provider.base_url);

    Ok(Fetcher::new(client, config.retry))
}
