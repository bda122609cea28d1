use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::WeatherError;

/// One normalized weather reading.
///
/// Every field the provider may omit is an `Option`. Precipitation is the
/// exception: the provider drops `rain`/`snow` entirely when nothing fell, so
/// those default to `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timestamp_utc: DateTime<Utc>,
    pub temp_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub humidity_pct: Option<i64>,
    pub pressure_hpa: Option<i64>,
    pub wind_speed_mps: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_deg: Option<i64>,
    pub rain_1h_mm: f64,
    pub rain_3h_mm: f64,
    pub snow_1h_mm: f64,
    pub clouds_pct: Option<i64>,
    pub weather_main: Option<String>,
    pub weather_description: Option<String>,
    /// Provider response body exactly as received.
    pub raw_json: String,
}

/// Where to fetch weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City {
        name: String,
        country: Option<String>,
    },
    Coords { lat: f64, lon: f64 },
}

impl Location {
    pub fn city(name: impl Into<String>, country: Option<&str>) -> Self {
        Self::City {
            name: name.into(),
            country: country.map(str::to_owned),
        }
    }

    /// Query parameters identifying this location to the provider.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Location::City { name, country: Some(cc) } => vec![("q", format!("{name},{cc}"))],
            Location::City { name, country: None } => vec![("q", name.clone())],
            Location::Coords { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City { name, country: Some(cc) } => write!(f, "{name}, {cc}"),
            Location::City { name, country: None } => f.write_str(name),
            Location::Coords { lat, lon } => write!(f, "{lat},{lon}"),
        }
    }
}

/// Parses `"London"`, `"London,GB"` or `"51.5074,-0.1278"`.
///
/// Input whose two comma-separated halves are both numbers is read as
/// coordinates; anything else is a city name with an optional country code.
impl FromStr for Location {
    type Err = WeatherError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WeatherError::InvalidLocation(
                "Enter a city name or coordinates as lat,lon (e.g. 51.5074,-0.1278).".to_string(),
            ));
        }

        let Some((left, right)) = input.split_once(',') else {
            return Ok(Location::city(input, None));
        };
        let (left, right) = (left.trim(), right.trim());

        if let (Ok(lat), Ok(lon)) = (left.parse::<f64>(), right.parse::<f64>()) {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(WeatherError::InvalidLocation(format!(
                    "Coordinates out of range: {lat},{lon}. \
                     Latitude must be within ±90, longitude within ±180."
                )));
            }
            return Ok(Location::Coords { lat, lon });
        }

        if left.is_empty() || right.is_empty() || right.contains(',') {
            return Err(WeatherError::InvalidLocation(format!(
                "Invalid location '{input}'. Use City, City,CC or lat,lon."
            )));
        }

        Ok(Location::city(left, Some(right)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_city() {
        let loc: Location = " Karachi ".parse().unwrap();
        assert_eq!(loc, Location::city("Karachi", None));
    }

    #[test]
    fn parses_city_with_country() {
        let loc: Location = "London, GB".parse().unwrap();
        assert_eq!(loc, Location::city("London", Some("GB")));
        assert_eq!(loc.query_params(), vec![("q", "London,GB".to_string())]);
    }

    #[test]
    fn parses_coordinates() {
        let loc: Location = "51.5074,-0.1278".parse().unwrap();
        assert_eq!(
            loc,
            Location::Coords {
                lat: 51.5074,
                lon: -0.1278
            }
        );
        assert_eq!(
            loc.query_params(),
            vec![("lat", "51.5074".to_string()), ("lon", "-0.1278".to_string())]
        );
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = "91,0".parse::<Location>().unwrap_err();
        assert!(matches!(err, WeatherError::InvalidLocation(_)));
    }

    #[test]
    fn rejects_empty_and_garbled_input() {
        assert!("".parse::<Location>().is_err());
        assert!("   ".parse::<Location>().is_err());
        assert!(",GB".parse::<Location>().is_err());
        assert!("a,b,c".parse::<Location>().is_err());
    }
}
