//! SQLite-backed, append-only storage of weather readings.
//!
//! Timestamps are written as `YYYY-MM-DDTHH:MM:SSZ` so that text ordering in
//! SQL matches chronological ordering.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params, types::Type};
use std::path::Path;

use crate::{error::Result, model::WeatherRecord};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        city TEXT,
        country TEXT,
        lat REAL,
        lon REAL,
        timestamp_utc TEXT NOT NULL,
        temp_c REAL,
        feels_like_c REAL,
        humidity_pct INTEGER,
        pressure_hpa INTEGER,
        wind_speed_mps REAL,
        wind_speed_kmh REAL,
        wind_deg INTEGER,
        rain_1h_mm REAL NOT NULL DEFAULT 0.0,
        rain_3h_mm REAL NOT NULL DEFAULT 0.0,
        snow_1h_mm REAL NOT NULL DEFAULT 0.0,
        clouds_pct INTEGER,
        weather_main TEXT,
        weather_description TEXT,
        raw_json TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_weather_readings_city_ts
        ON weather_readings(city, timestamp_utc DESC);
"#;

pub struct WeatherStore {
    conn: Connection,
}

impl WeatherStore {
    /// Open (or create) the database file at `path` and ensure the table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!("Opening weather store at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Store that lives only as long as the value, for tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Append one reading and return its row id.
    ///
    /// Readings dated outside years 0000-9999 are refused, since their text
    /// form could not be read back.
    pub fn insert(&self, record: &WeatherRecord) -> Result<i64> {
        let timestamp = format_timestamp(&record.timestamp_utc)?;

        self.conn.execute(
            "INSERT INTO weather_readings (
                city, country, lat, lon, timestamp_utc, temp_c, feels_like_c,
                humidity_pct, pressure_hpa, wind_speed_mps, wind_speed_kmh, wind_deg,
                rain_1h_mm, rain_3h_mm, snow_1h_mm, clouds_pct,
                weather_main, weather_description, raw_json
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )",
            params![
                record.city,
                record.country,
                record.lat,
                record.lon,
                timestamp,
                record.temp_c,
                record.feels_like_c,
                record.humidity_pct,
                record.pressure_hpa,
                record.wind_speed_mps,
                record.wind_speed_kmh,
                record.wind_deg,
                record.rain_1h_mm,
                record.rain_3h_mm,
                record.snow_1h_mm,
                record.clouds_pct,
                record.weather_main,
                record.weather_description,
                record.raw_json,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Stored reading {id} for {:?}", record.city);
        Ok(id)
    }

    /// Up to `limit` readings for exactly `city`, most recent first.
    pub fn fetch_recent(&self, city: &str, limit: usize) -> Result<Vec<WeatherRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            "SELECT * FROM weather_readings
             WHERE city = ?1
             ORDER BY timestamp_utc DESC, id DESC
             LIMIT ?2",
        )?;

        let records = stmt
            .query_map(params![city, limit], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Total number of stored readings.
    pub fn count(&self) -> Result<u64> {
        let sql = "SELECT COUNT(*) FROM weather_readings";
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> rusqlite::Result<String> {
    if !(0..=9999).contains(&ts.year()) {
        return Err(rusqlite::Error::ToSqlConversionFailure(
            format!("timestamp {ts} is outside years 0000-9999").into(),
        ));
    }
    Ok(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn row_to_record(row: &Row) -> rusqlite::Result<WeatherRecord> {
    let ts: String = row.get("timestamp_utc")?;
    let timestamp_utc = DateTime::parse_from_rfc3339(&ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(WeatherRecord {
        city: row.get("city")?,
        country: row.get("country")?,
        lat: row.get("lat")?,
        lon: row.get("lon")?,
        timestamp_utc,
        temp_c: row.get("temp_c")?,
        feels_like_c: row.get("feels_like_c")?,
        humidity_pct: row.get("humidity_pct")?,
        pressure_hpa: row.get("pressure_hpa")?,
        wind_speed_mps: row.get("wind_speed_mps")?,
        wind_speed_kmh: row.get("wind_speed_kmh")?,
        wind_deg: row.get("wind_deg")?,
        rain_1h_mm: row.get("rain_1h_mm")?,
        rain_3h_mm: row.get("rain_3h_mm")?,
        snow_1h_mm: row.get("snow_1h_mm")?,
        clouds_pct: row.get("clouds_pct")?,
        weather_main: row.get("weather_main")?,
        weather_description: row.get("weather_description")?,
        raw_json: row.get("raw_json")?,
    })
}
