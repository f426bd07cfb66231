//! Mock forecast source for testing without network calls.

use super::{DataSourceError, ForecastSource};
use crate::domain::WeatherEntry;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock source that replays scripted responses, then repeats a default batch.
#[derive(Debug, Default)]
pub struct MockDataSource {
    scripted: Mutex<VecDeque<Result<Vec<WeatherEntry>, DataSourceError>>>,
    entries: Vec<WeatherEntry>,
    fetches: AtomicUsize,
}

impl MockDataSource {
    /// Create a new mock source that returns an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch returned once scripted responses are exhausted.
    pub fn with_entries(mut self, entries: Vec<WeatherEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Queue a one-off response ahead of the default batch.
    pub fn with_response(self, response: Result<Vec<WeatherEntry>, DataSourceError>) -> Self {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.push_back(response);
        }
        self
    }

    /// Number of times `fetch_forecast` has been called.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastSource for MockDataSource {
    async fn fetch_forecast(&self) -> Result<Vec<WeatherEntry>, DataSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let next = self
            .scripted
            .lock()
            .map_err(|_| DataSourceError::Other("mock state poisoned".to_string()))?
            .pop_front();

        next.unwrap_or_else(|| Ok(self.entries.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NormalizedDate;

    fn make_entry() -> WeatherEntry {
        let date = NormalizedDate::from_ymd(2024, 1, 1).unwrap();
        WeatherEntry::new(800, date, 1.0, 5.0, 40.0, 1010.0, 2.0, 90.0)
    }

    #[tokio::test]
    async fn test_mock_returns_default_entries() {
        let mock = MockDataSource::new().with_entries(vec![make_entry()]);
        assert_eq!(mock.fetch_forecast().await.unwrap(), vec![make_entry()]);
        assert_eq!(mock.fetch_forecast().await.unwrap().len(), 1);
        assert_eq!(mock.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_scripted_responses_first() {
        let mock = MockDataSource::new()
            .with_entries(vec![make_entry()])
            .with_response(Err(DataSourceError::RateLimited))
            .with_response(Ok(vec![]));

        assert_eq!(
            mock.fetch_forecast().await.unwrap_err(),
            DataSourceError::RateLimited
        );
        assert!(mock.fetch_forecast().await.unwrap().is_empty());
        assert_eq!(mock.fetch_forecast().await.unwrap().len(), 1);
    }
}
