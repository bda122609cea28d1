//! Mapping of the OpenWeather "current weather" document into [`WeatherRecord`].

use chrono::{DateTime, Datelike, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, de};

use crate::{
    error::{Result, WeatherError},
    model::WeatherRecord,
};

const MPS_TO_KMH: f64 = 3.6;

/// 2^53; integral floats above this may already have lost precision.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Integer field that also accepts integral floats such as `45.0`.
fn integral<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    match Option::<Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Number::Int(n)) => Ok(Some(n)),
        Some(Number::Float(f)) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT => {
            Ok(Some(f as i64))
        }
        Some(Number::Float(f)) => Err(de::Error::custom(format!(
            "expected an integer, found {f}"
        ))),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    #[serde(deserialize_with = "integral")]
    humidity: Option<i64>,
    #[serde(deserialize_with = "integral")]
    pressure: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: Option<f64>,
    #[serde(deserialize_with = "integral")]
    deg: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwClouds {
    #[serde(deserialize_with = "integral")]
    all: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwPrecipitation {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    name: Option<String>,
    dt: Option<i64>,
    coord: Option<OwCoord>,
    sys: Option<OwSys>,
    main: Option<OwMain>,
    wind: Option<OwWind>,
    clouds: Option<OwClouds>,
    weather: Option<Vec<OwWeather>>,
    rain: Option<OwPrecipitation>,
    snow: Option<OwPrecipitation>,
}

/// Turn a provider response body into a [`WeatherRecord`].
///
/// `captured_at` stands in for the observation time when the provider omits
/// `dt`; it is truncated to whole seconds. The function is pure: the same body
/// and capture time always produce the same record.
pub fn normalize(body: &str, captured_at: DateTime<Utc>) -> Result<WeatherRecord> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| WeatherError::MalformedResponse(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(WeatherError::MalformedResponse(
            "expected a JSON object at the top level".to_string(),
        ));
    }

    let parsed = OwCurrentResponse::deserialize(&value)
        .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;

    let timestamp_utc = match parsed.dt {
        Some(dt) => DateTime::from_timestamp(dt, 0)
            .filter(|ts| (0..=9999).contains(&ts.year()))
            .ok_or_else(|| {
                WeatherError::MalformedResponse(format!("timestamp {dt} is out of range"))
            })?,
        None => captured_at.trunc_subsecs(0),
    };

    let coord = parsed.coord.unwrap_or_default();
    let main = parsed.main.unwrap_or_default();
    let wind = parsed.wind.unwrap_or_default();
    let rain = parsed.rain.unwrap_or_default();
    let snow = parsed.snow.unwrap_or_default();
    let condition = parsed
        .weather
        .and_then(|w| w.into_iter().next())
        .unwrap_or_default();

    Ok(WeatherRecord {
        city: parsed.name,
        country: parsed.sys.and_then(|s| s.country),
        lat: coord.lat,
        lon: coord.lon,
        timestamp_utc,
        temp_c: main.temp,
        feels_like_c: main.feels_like,
        humidity_pct: main.humidity,
        pressure_hpa: main.pressure,
        wind_speed_mps: wind.speed,
        wind_speed_kmh: wind.speed.map(|mps| mps * MPS_TO_KMH),
        wind_deg: wind.deg,
        rain_1h_mm: rain.one_hour.unwrap_or(0.0),
        rain_3h_mm: rain.three_hours.unwrap_or(0.0),
        snow_1h_mm: snow.one_hour.unwrap_or(0.0),
        clouds_pct: parsed.clouds.and_then(|c| c.all),
        weather_main: condition.main,
        weather_description: condition.description,
        raw_json: body.to_string(),
    })
}
