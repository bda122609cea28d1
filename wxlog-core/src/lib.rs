//! Core library for the `wxlog` CLI.
//!
//! This crate defines:
//! - The canonical weather record and location types
//! - Fetching from OpenWeather with bounded retry, plus normalization
//! - Append-only SQLite storage of readings
//! - Threshold-based alerts
//! - Configuration & credentials handling
//!
//! It is used by `wxlog-cli`, but can also be reused by other binaries or services.

pub mod alert;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod retry;
pub mod service;
pub mod store;

pub use alert::{Thresholds, evaluate};
pub use config::Config;
pub use error::{Result, WeatherError};
pub use model::{Location, WeatherRecord};
pub use normalize::normalize;
pub use provider::{Fetcher, Transport, fetcher_from_config, openweather::OpenWeatherClient};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use service::{Observation, WeatherService};
pub use store::WeatherStore;
