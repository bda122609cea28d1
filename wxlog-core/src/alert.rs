use serde::{Deserialize, Serialize};

use crate::model::WeatherRecord;

/// Upper bounds above which a reading produces an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temp_c: f64,
    pub wind_speed_kmh: f64,
    pub rain_1h_mm: f64,
    pub snow_1h_mm: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_c: 38.0,
            wind_speed_kmh: 30.0,
            rain_1h_mm: 10.0,
            snow_1h_mm: 5.0,
        }
    }
}

/// Warnings for every metric of `record` strictly above its threshold.
///
/// Order is always temperature, wind, rain, snow. Missing values never alert.
pub fn evaluate(record: &WeatherRecord, thresholds: &Thresholds) -> Vec<String> {
    let mut alerts = Vec::new();

    if let Some(temp) = record.temp_c.filter(|t| *t > thresholds.temp_c) {
        alerts.push(format!(
            "High Temperature Alert: {temp}°C exceeds threshold of {}°C",
            thresholds.temp_c
        ));
    }
    if let Some(wind) = record
        .wind_speed_kmh
        .filter(|w| *w > thresholds.wind_speed_kmh)
    {
        alerts.push(format!(
            "High Wind Speed Alert: {wind} km/h exceeds threshold of {} km/h",
            thresholds.wind_speed_kmh
        ));
    }
    if record.rain_1h_mm > thresholds.rain_1h_mm {
        alerts.push(format!(
            "Heavy Rain Alert: {} mm in last hour exceeds threshold of {} mm",
            record.rain_1h_mm, thresholds.rain_1h_mm
        ));
    }
    if record.snow_1h_mm > thresholds.snow_1h_mm {
        alerts.push(format!(
            "Heavy Snow Alert: {} mm in last hour exceeds threshold of {} mm",
            record.snow_1h_mm, thresholds.snow_1h_mm
        ));
    }

    alerts
}
