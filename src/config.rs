use crate::datasource::openweather::{DEFAULT_BASE_URL, DEFAULT_RETRY_BUDGET};
use crate::datasource::{Units, NUM_DAYS};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub weather_api_url: String,
    pub location: String,
    pub units: Units,
    pub forecast_days: u32,
    pub sync_interval: Duration,
    pub cleanup_interval: Duration,
    pub fetch_retry_budget: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let weather_api_url = env_map
            .get("WEATHER_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let location = env_map
            .get("WEATHER_LOCATION")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "Mountain View, CA".to_string());
        if location.is_empty() {
            return Err(ConfigError::InvalidValue(
                "WEATHER_LOCATION".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let units = match env_map
            .get("WEATHER_UNITS")
            .map(|s| s.as_str())
            .unwrap_or("metric")
        {
            "metric" => Units::Metric,
            "imperial" => Units::Imperial,
            other => {
                return Err(ConfigError::InvalidValue(
                    "WEATHER_UNITS".to_string(),
                    format!("must be metric or imperial, got {}", other),
                ))
            }
        };

        let forecast_days = match env_map.get("FORECAST_DAYS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|days| (1..=16).contains(days))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "FORECAST_DAYS".to_string(),
                        "must be an integer between 1 and 16".to_string(),
                    )
                })?,
            None => NUM_DAYS,
        };

        let sync_interval = parse_interval_secs(&env_map, "SYNC_INTERVAL_SECS", 3 * 60 * 60)?;
        let cleanup_interval = parse_interval_secs(&env_map, "CLEANUP_INTERVAL_SECS", 24 * 60 * 60)?;
        let fetch_retry_budget =
            parse_interval_secs(&env_map, "FETCH_RETRY_SECS", DEFAULT_RETRY_BUDGET.as_secs())?;

        Ok(Config {
            port,
            database_path,
            weather_api_url,
            location,
            units,
            forecast_days,
            sync_interval,
            cleanup_interval,
            fetch_retry_budget,
        })
    }
}

fn parse_interval_secs(
    env_map: &HashMap<String, String>,
    key: &str,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let secs = match env_map.get(key) {
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a whole number of seconds".to_string())
        })?,
        None => default_secs,
    };

    if secs == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
