//! Remote forecast sources and the network data source built on top of them.

use crate::domain::WeatherEntry;
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod network;
pub mod openweather;

pub use mock::MockDataSource;
pub use network::{FetchOutcome, ForecastBatch, WeatherNetworkDataSource, NUM_DAYS};
pub use openweather::{OpenWeatherSource, Units};

/// A remote provider of daily forecasts.
///
/// Implementations handle their own transport retries; a returned error is
/// final for this fetch attempt.
#[async_trait]
pub trait ForecastSource: Send + Sync + fmt::Debug {
    /// Fetch the forecast window, one entry per day, dates normalized to UTC.
    ///
    /// An empty vector means the provider answered but had no rows.
    async fn fetch_forecast(&self) -> Result<Vec<WeatherEntry>, DataSourceError>;
}

/// Error type for forecast source operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// The provider does not know the configured location
    InvalidLocation,
    /// Rate limit exceeded
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::InvalidLocation => write!(f, "Invalid location"),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
