//! OpenWeatherMap-style daily forecast client.

use super::{DataSourceError, ForecastSource};
use crate::domain::{Clock, NormalizedDate, SystemClock, WeatherEntry};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://andfun-weather.udacity.com/staticweather";

/// How long transient failures are retried before a fetch gives up.
pub const DEFAULT_RETRY_BUDGET: Duration = Duration::from_secs(30);

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

/// Daily forecast client for a fixed location.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    client: Client,
    base_url: String,
    location: String,
    units: Units,
    days: u32,
    clock: Arc<dyn Clock>,
    retry_budget: Duration,
}

impl OpenWeatherSource {
    pub fn new(base_url: String, location: String, units: Units, days: u32) -> Self {
        Self {
            client: Client::new(),
            base_url,
            location,
            units,
            days,
            clock: Arc::new(SystemClock),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    /// Replace the clock used to date the returned rows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Give up retrying 429 and 5xx answers once `budget` has elapsed.
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = budget;
        self
    }

    async fn get_forecast_json(&self) -> Result<serde_json::Value, DataSourceError> {
        let days = self.days.to_string();
        let query = [
            ("q", self.location.as_str()),
            ("mode", "json"),
            ("units", self.units.as_str()),
            ("cnt", days.as_str()),
        ];
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_budget),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&self.base_url)
                .query(&query)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status == 404 {
                return Err(backoff::Error::permanent(DataSourceError::InvalidLocation));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl ForecastSource for OpenWeatherSource {
    async fn fetch_forecast(&self) -> Result<Vec<WeatherEntry>, DataSourceError> {
        debug!(
            "Fetching forecast for location={}, units={}, days={}",
            self.location,
            self.units.as_str(),
            self.days
        );

        let response = self.get_forecast_json().await?;
        parse_forecast(&response, self.clock.today())
    }
}

/// Turn a daily forecast document into rows dated `today`, `today + 1`, ...
pub(crate) fn parse_forecast(
    response: &serde_json::Value,
    today: NormalizedDate,
) -> Result<Vec<WeatherEntry>, DataSourceError> {
    check_status_code(response)?;

    let days = response
        .get("list")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataSourceError::ParseError("Missing list field".to_string()))?;

    let mut entries = Vec::with_capacity(days.len());
    for (offset, day_json) in days.iter().enumerate() {
        match parse_day(day_json, today.add_days(offset as i64)) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!("Failed to parse forecast day {}: {}", offset, e);
            }
        }
    }

    Ok(entries)
}

/// Some providers answer 200 but carry the real status in `cod`.
fn check_status_code(response: &serde_json::Value) -> Result<(), DataSourceError> {
    let code = match response.get("cod") {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.parse::<i64>().ok(),
        _ => return Ok(()),
    };

    match code {
        Some(200) | None => Ok(()),
        Some(404) => Err(DataSourceError::InvalidLocation),
        Some(other) => Err(DataSourceError::HttpError {
            status: u16::try_from(other).unwrap_or(0),
            message: response
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Provider error")
                .to_string(),
        }),
    }
}

fn parse_day(day_json: &serde_json::Value, date: NormalizedDate) -> Result<WeatherEntry, DataSourceError> {
    let number = |field: &str| {
        day_json
            .get(field)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", field)))
    };

    let pressure = number("pressure")?;
    let humidity = number("humidity")?;
    let wind = number("speed")?;
    let degrees = number("deg")?;

    let temp = day_json
        .get("temp")
        .ok_or_else(|| DataSourceError::ParseError("Missing temp field".to_string()))?;
    let min = temp
        .get("min")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| DataSourceError::ParseError("Missing temp.min field".to_string()))?;
    let max = temp
        .get("max")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| DataSourceError::ParseError("Missing temp.max field".to_string()))?;

    let weather_id = day_json
        .get("weather")
        .and_then(|v| v.as_array())
        .and_then(|w| w.first())
        .and_then(|w| w.get("id"))
        .and_then(|v| v.as_i64())
        .ok_or_else(|| DataSourceError::ParseError("Missing weather[0].id field".to_string()))?;
    let weather_icon_id = i32::try_from(weather_id)
        .map_err(|_| DataSourceError::ParseError(format!("Invalid weather id: {}", weather_id)))?;

    Ok(WeatherEntry::new(
        weather_icon_id,
        date,
        min,
        max,
        humidity,
        pressure,
        wind,
        degrees,
    ))
}
