//! Plain-text rendering of readings, history and alerts.

use std::fmt::{Display, Write};
use wxlog_core::{Observation, WeatherRecord};

const NA: &str = "n/a";

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

fn or_na_1(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:.1}"))
}

pub fn observation(obs: &Observation) -> String {
    let mut out = latest(&obs.latest);
    out.push('\n');
    out.push_str(&history(&obs.history));
    out.push_str(&alerts(&obs.alerts));
    out
}

pub fn latest(record: &WeatherRecord) -> String {
    let place = match (&record.city, &record.country) {
        (Some(city), Some(country)) => format!("{city}, {country}"),
        (Some(city), None) => city.clone(),
        _ => match (record.lat, record.lon) {
            (Some(lat), Some(lon)) => format!("{lat:.4},{lon:.4}"),
            _ => "unknown location".to_string(),
        },
    };

    let mut out = String::new();
    let when = record.timestamp_utc.format("%Y-%m-%d %H:%M UTC");
    let _ = writeln!(out, "Latest weather in {place} ({when})");
    if let Some(desc) = &record.weather_description {
        let _ = writeln!(out, "  Conditions:  {desc}");
    }
    let _ = writeln!(out, "  Temperature: {} °C", or_na(record.temp_c));
    let _ = writeln!(out, "  Feels like:  {} °C", or_na(record.feels_like_c));
    let _ = writeln!(out, "  Humidity:    {} %", or_na(record.humidity_pct));
    let _ = writeln!(out, "  Pressure:    {} hPa", or_na(record.pressure_hpa));
    let _ = writeln!(out, "  Wind:        {} km/h", or_na_1(record.wind_speed_kmh));
    let _ = writeln!(out, "  Rain (1h):   {} mm", record.rain_1h_mm);
    let _ = writeln!(out, "  Snow (1h):   {} mm", record.snow_1h_mm);
    out
}

pub fn history(records: &[WeatherRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Recent readings ({}):", records.len());
    let _ = writeln!(
        out,
        "  {:<17} {:>7} {:>7} {:>5} {:>7} {:>6} {:>6}",
        "time (UTC)", "temp", "feels", "hum", "wind", "rain", "snow"
    );
    for r in records {
        let _ = writeln!(
            out,
            "  {:<17} {:>7} {:>7} {:>5} {:>7} {:>6.1} {:>6.1}",
            r.timestamp_utc.format("%Y-%m-%d %H:%M").to_string(),
            or_na_1(r.temp_c),
            or_na_1(r.feels_like_c),
            or_na(r.humidity_pct),
            or_na_1(r.wind_speed_kmh),
            r.rain_1h_mm,
            r.snow_1h_mm,
        );
    }
    out
}

pub fn alerts(alerts: &[String]) -> String {
    if alerts.is_empty() {
        return "No weather alerts.\n".to_string();
    }
    alerts.iter().map(|a| format!("WARNING: {a}\n")).collect()
}
