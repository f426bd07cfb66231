pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod error;
pub mod injector;
pub mod repository;
pub mod scheduler;
pub mod viewmodel;

pub use config::Config;
pub use datasource::{
    DataSourceError, FetchOutcome, ForecastSource, MockDataSource, OpenWeatherSource,
    WeatherNetworkDataSource,
};
pub use db::{init_db, LiveQuery, WeatherDao};
pub use domain::{Clock, FixedClock, ListWeatherEntry, NormalizedDate, SystemClock, WeatherEntry};
pub use error::AppError;
pub use injector::Injector;
pub use repository::{RepositoryError, SunshineRepository};
pub use scheduler::PeriodicTask;
pub use viewmodel::{DetailViewModel, MainViewModel};
