//! Forecast row types.

use super::NormalizedDate;
use serde::{Deserialize, Serialize};

/// One day of forecast data. The store keeps at most one row per `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherEntry {
    /// Row id assigned by the store; `None` for rows that were never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Weather condition code as reported by the forecast provider.
    pub weather_icon_id: i32,
    pub date: NormalizedDate,
    pub min: f64,
    pub max: f64,
    pub humidity: f64,
    pub pressure: f64,
    /// Wind speed.
    pub wind: f64,
    /// Wind direction in meteorological degrees.
    pub degrees: f64,
}

impl WeatherEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        weather_icon_id: i32,
        date: NormalizedDate,
        min: f64,
        max: f64,
        humidity: f64,
        pressure: f64,
        wind: f64,
        degrees: f64,
    ) -> Self {
        Self {
            id: None,
            weather_icon_id,
            date,
            min,
            max,
            humidity,
            pressure,
            wind,
            degrees,
        }
    }
}

/// Reduced projection of [`WeatherEntry`] used for list display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWeatherEntry {
    pub id: i64,
    pub weather_icon_id: i32,
    pub date: NormalizedDate,
    pub min: f64,
    pub max: f64,
}
