//! Mediator between the network data source and the local weather store.

use crate::datasource::{ForecastBatch, WeatherNetworkDataSource};
use crate::db::{LiveQuery, WeatherDao};
use crate::domain::{Clock, ListWeatherEntry, NormalizedDate, WeatherEntry};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Handles data operations for the forecast cache.
///
/// On construction the repository subscribes to the network source's batch
/// stream; every batch is persisted on a background task so readers never
/// wait on a network write. Reads go straight to the store as live queries.
#[derive(Debug)]
pub struct SunshineRepository {
    dao: WeatherDao,
    network: Arc<WeatherNetworkDataSource>,
    clock: Arc<dyn Clock>,
    num_days: u32,
    initialized: Mutex<bool>,
    subscription: Subscription,
}

impl SunshineRepository {
    /// Build the repository and start persisting network batches.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(
        dao: WeatherDao,
        network: Arc<WeatherNetworkDataSource>,
        clock: Arc<dyn Clock>,
        num_days: u32,
    ) -> Self {
        let subscription = Subscription::spawn(network.current_weather_forecasts(), dao.clone());
        info!(look_ahead_days = num_days, "Made new repository");

        Self {
            dao,
            network,
            clock,
            num_days,
            initialized: Mutex::new(false),
            subscription,
        }
    }

    /// Kick off the first sync. Only the first call per repository does
    /// anything; it returns `true`, every later call returns `false`.
    pub fn initialize_data(&self) -> bool {
        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *initialized {
            return false;
        }
        *initialized = true;

        self.start_fetch_weather_service();
        true
    }

    /// Simplified forecast rows from today onward, oldest first.
    pub fn get_current_weather_forecasts(&self) -> LiveQuery<Vec<ListWeatherEntry>> {
        self.initialize_data();
        self.dao.get_current_weather_forecasts(self.today())
    }

    /// The full forecast row for `date`, if cached.
    pub fn get_weather_by_date(&self, date: NormalizedDate) -> LiveQuery<Option<WeatherEntry>> {
        self.initialize_data();
        self.dao.get_weather_by_date(date)
    }

    /// Remove rows dated before today. Meant to be called by a scheduler.
    pub async fn delete_old_data(&self) -> Result<u64, RepositoryError> {
        let today = self.today();
        let deleted = self.dao.delete_old_weather(today).await?;
        info!(deleted, before = %today, "Deleted old weather data");
        Ok(deleted)
    }

    /// Whether fewer than `num_days` days from today onward are cached.
    pub async fn is_fetch_needed(&self) -> Result<bool, RepositoryError> {
        let count = self.count_future_days().await?;
        Ok(count < i64::from(self.num_days))
    }

    /// Number of cached rows dated today or later.
    pub async fn count_future_days(&self) -> Result<i64, RepositoryError> {
        Ok(self.dao.count_all_future_weather(self.today()).await?)
    }

    /// Request an immediate background fetch.
    pub fn start_fetch_weather_service(&self) {
        self.network.start_fetch_weather_service();
    }

    pub fn today(&self) -> NormalizedDate {
        self.clock.today()
    }

    pub fn num_days(&self) -> u32 {
        self.num_days
    }

    /// Stop persisting network batches. Reads keep working.
    pub fn shutdown(&self) {
        self.subscription.cancel();
    }
}

/// The repository's subscription to network batches.
///
/// Cancelled on [`SunshineRepository::shutdown`] or when dropped.
#[derive(Debug)]
struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    fn spawn(batches: watch::Receiver<Option<ForecastBatch>>, dao: WeatherDao) -> Self {
        Self {
            handle: tokio::spawn(persist_batches(batches, dao)),
        }
    }

    fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Write each batch to the store, starting with any batch already published.
async fn persist_batches(mut batches: watch::Receiver<Option<ForecastBatch>>, dao: WeatherDao) {
    loop {
        let batch = batches.borrow_and_update().clone();
        match batch {
            Some(batch) if !batch.is_empty() => match dao.bulk_insert(&batch).await {
                Ok(rows) => info!(rows, "New values inserted"),
                Err(e) => error!(error = %e, "Failed to persist forecast batch"),
            },
            Some(_) => debug!("Ignoring empty forecast batch"),
            None => {}
        }

        if batches.changed().await.is_err() {
            debug!("Network source dropped, subscription ended");
            break;
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
