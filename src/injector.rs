//! Builds the long-lived components once and hands out shared handles.

use crate::config::Config;
use crate::datasource::{ForecastSource, OpenWeatherSource, WeatherNetworkDataSource};
use crate::db::{init_db, WeatherDao};
use crate::domain::{Clock, SystemClock};
use crate::repository::SunshineRepository;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Dependency container constructed at process start.
///
/// Each accessor constructs its component on first use; concurrent first
/// callers wait on the same construction and all receive the same instance.
#[derive(Debug)]
pub struct Injector {
    config: Config,
    clock: Arc<dyn Clock>,
    source: Option<Arc<dyn ForecastSource>>,
    dao: OnceCell<WeatherDao>,
    network: OnceCell<Arc<WeatherNetworkDataSource>>,
    repository: OnceCell<Arc<SunshineRepository>>,
}

impl Injector {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            source: None,
            dao: OnceCell::new(),
            network: OnceCell::new(),
            repository: OnceCell::new(),
        }
    }

    /// Use `source` instead of the configured HTTP provider.
    pub fn with_source(mut self, source: Arc<dyn ForecastSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn dao(&self) -> Result<WeatherDao, sqlx::Error> {
        self.dao
            .get_or_try_init(|| async {
                let pool = init_db(&self.config.database_path).await?;
                Ok::<_, sqlx::Error>(WeatherDao::new(pool))
            })
            .await
            .cloned()
    }

    pub async fn network(&self) -> Arc<WeatherNetworkDataSource> {
        self.network
            .get_or_init(|| async {
                let source = self.source.clone().unwrap_or_else(|| {
                    Arc::new(
                        OpenWeatherSource::new(
                            self.config.weather_api_url.clone(),
                            self.config.location.clone(),
                            self.config.units,
                            self.config.forecast_days,
                        )
                        .with_clock(self.clock.clone())
                        .with_retry_budget(self.config.fetch_retry_budget),
                    )
                });
                Arc::new(WeatherNetworkDataSource::new(source))
            })
            .await
            .clone()
    }

    pub async fn repository(&self) -> Result<Arc<SunshineRepository>, sqlx::Error> {
        self.repository
            .get_or_try_init(|| async {
                let dao = self.dao().await?;
                let network = self.network().await;
                Ok::<_, sqlx::Error>(Arc::new(SunshineRepository::new(
                    dao,
                    network,
                    self.clock.clone(),
                    self.config.forecast_days,
                )))
            })
            .await
            .cloned()
    }
}
