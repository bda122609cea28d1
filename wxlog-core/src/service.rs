//! One user action: fetch, persist, read back history, evaluate alerts.

use crate::{
    alert::{Thresholds, evaluate},
    error::Result,
    model::{Location, WeatherRecord},
    provider::{Fetcher, Transport},
    store::WeatherStore,
};

/// Everything the UI needs after a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Row id of the reading just stored.
    pub id: i64,
    pub latest: WeatherRecord,
    /// Recent readings for the same city, most recent first.
    pub history: Vec<WeatherRecord>,
    pub alerts: Vec<String>,
}

pub struct WeatherService<T: Transport> {
    fetcher: Fetcher<T>,
    store: WeatherStore,
    thresholds: Thresholds,
    history_limit: usize,
}

impl<T: Transport> WeatherService<T> {
    pub fn new(
        fetcher: Fetcher<T>,
        store: WeatherStore,
        thresholds: Thresholds,
        history_limit: usize,
    ) -> Self {
        Self {
            fetcher,
            store,
            thresholds,
            history_limit,
        }
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    pub async fn observe(&self, location: &Location) -> Result<Observation> {
        let record = self.fetcher.fetch(location).await?;
        let id = self.store.insert(&record)?;

        let history = match record.city.as_deref() {
            Some(city) => self.store.fetch_recent(city, self.history_limit)?,
            None => Vec::new(),
        };
        let history = if history.is_empty() { vec![record] } else { history };

        // `history` is never empty here.
        let latest = history[0].clone();
        let alerts = evaluate(&latest, &self.thresholds);

        Ok(Observation {
            id,
            latest,
            history,
            alerts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FixedTransport(&'static str);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn current_weather(&self, _location: &Location) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn service(body: &'static str) -> WeatherService<FixedTransport> {
        let fetcher = Fetcher::new(FixedTransport(body), RetryPolicy::default());
        let store = WeatherStore::in_memory().unwrap();
        WeatherService::new(fetcher, store, Thresholds::default(), 100)
    }

    #[tokio::test]
    async fn observe_stores_and_returns_history() {
        let svc = service(
            r#"{"name": "Jacobabad", "dt": 1717243200,
                "main": {"temp": 47.5}, "wind": {"speed": 2.0}}"#,
        );
        let loc = Location::city("Jacobabad", None);

        let first = svc.observe(&loc).await.unwrap();
        let second = svc.observe(&loc).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(second.history.len(), 2);
        assert_eq!(second.latest.temp_c, Some(47.5));
        assert_eq!(second.alerts.len(), 1);
        assert!(second.alerts[0].contains("47.5"));
        assert_eq!(svc.store().count().unwrap(), 2);
    }

    #[tokio::test]
    async fn reading_without_city_still_reports() {
        let svc = service(r#"{"dt": 1717243200, "rain": {"1h": 14.0}}"#);

        let null_island = Location::Coords { lat: 0.0, lon: 0.0 };
        let obs = svc.observe(&null_island).await.unwrap();

        assert_eq!(obs.history.len(), 1);
        assert_eq!(obs.latest.city, None);
        assert_eq!(obs.alerts.len(), 1);
        assert!(obs.alerts[0].starts_with("Heavy Rain Alert"));
    }

    #[tokio::test]
    async fn malformed_response_is_not_stored() {
        let svc = service("[]");

        let err = svc.observe(&Location::city("X", None)).await.unwrap_err();

        assert!(matches!(err, crate::WeatherError::MalformedResponse(_)));
        assert_eq!(svc.store().count().unwrap(), 0);
    }
}
