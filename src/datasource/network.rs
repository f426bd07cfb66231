//! Network data source: fetches forecasts and publishes the latest batch.

use super::{DataSourceError, ForecastSource};
use crate::domain::WeatherEntry;
use crate::scheduler::PeriodicTask;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Number of days of forecast the cache aims to hold, today included.
pub const NUM_DAYS: u32 = 14;

/// One fetch worth of forecast rows.
pub type ForecastBatch = Arc<[WeatherEntry]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A batch with this many rows was published to subscribers.
    Published(usize),
    /// The provider returned no rows; nothing was published.
    Empty,
}

/// Owns the remote source and the observable "latest batch" slot.
///
/// Subscribers see only the most recent batch: a slow subscriber that misses
/// an intermediate batch still converges on the newest one.
#[derive(Debug)]
pub struct WeatherNetworkDataSource {
    source: Arc<dyn ForecastSource>,
    latest: watch::Sender<Option<ForecastBatch>>,
    runtime: Handle,
}

impl WeatherNetworkDataSource {
    /// Must be called from inside a tokio runtime. Background fetches are
    /// spawned on that runtime, whichever thread requests them later.
    pub fn new(source: Arc<dyn ForecastSource>) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            source,
            latest,
            runtime: Handle::current(),
        }
    }

    /// Observable stream of the most recently fetched batch.
    pub fn current_weather_forecasts(&self) -> watch::Receiver<Option<ForecastBatch>> {
        self.latest.subscribe()
    }

    /// Fetch once and publish the result if it has any rows.
    pub async fn fetch_weather(&self) -> Result<FetchOutcome, DataSourceError> {
        let entries = self.source.fetch_forecast().await?;
        if entries.is_empty() {
            warn!("Forecast provider returned no rows");
            return Ok(FetchOutcome::Empty);
        }

        let count = entries.len();
        self.latest.send_replace(Some(entries.into()));
        info!(rows = count, "Published new forecast batch");
        Ok(FetchOutcome::Published(count))
    }

    /// Fire-and-forget fetch on a background task.
    ///
    /// Failures are logged; the handle is only needed by callers that want to
    /// wait for the attempt to finish.
    pub fn start_fetch_weather_service(self: &Arc<Self>) -> JoinHandle<()> {
        info!("Immediate forecast fetch requested");
        let this = Arc::clone(self);
        self.runtime.spawn(async move {
            this.fetch_and_log().await;
        })
    }

    /// Fetch on a fixed period until the returned task is dropped.
    pub fn schedule_recurring_fetch_weather_sync(self: &Arc<Self>, period: Duration) -> PeriodicTask {
        let this = Arc::clone(self);
        PeriodicTask::spawn("forecast-sync", period, move || {
            let this = Arc::clone(&this);
            async move {
                this.fetch_and_log().await;
            }
        })
    }

    async fn fetch_and_log(&self) {
        if let Err(e) = self.fetch_weather().await {
            error!(error = %e, "Forecast fetch failed");
        }
    }
}
