use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::{ListWeatherEntry, NormalizedDate, WeatherEntry};
use crate::error::AppError;
use crate::viewmodel::{DetailViewModel, MainViewModel};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastDayDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDayDto {
    pub id: i64,
    pub date: String,
    pub weather_icon_id: i32,
    pub min: f64,
    pub max: f64,
}

impl From<ListWeatherEntry> for ForecastDayDto {
    fn from(entry: ListWeatherEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date.to_string(),
            weather_icon_id: entry.weather_icon_id,
            min: entry.min,
            max: entry.max,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDetailDto {
    pub date: String,
    pub weather_icon_id: i32,
    pub min: f64,
    pub max: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind: f64,
    pub degrees: f64,
}

impl From<WeatherEntry> for WeatherDetailDto {
    fn from(entry: WeatherEntry) -> Self {
        Self {
            date: entry.date.to_string(),
            weather_icon_id: entry.weather_icon_id,
            min: entry.min,
            max: entry.max,
            humidity: entry.humidity,
            pressure: entry.pressure,
            wind: entry.wind,
            degrees: entry.degrees,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub today: String,
    pub future_days: i64,
    pub look_ahead_days: u32,
    pub fetch_needed: bool,
}

pub async fn get_forecast(State(state): State<AppState>) -> Result<Json<ForecastResponse>, AppError> {
    let view_model = MainViewModel::new(&state.repo);
    let rows = view_model.forecast.current().await?;

    Ok(Json(ForecastResponse {
        forecast: rows.into_iter().map(ForecastDayDto::from).collect(),
    }))
}

pub async fn get_weather_for_date(
    Path(date): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WeatherDetailDto>, AppError> {
    let date: NormalizedDate = date.parse()?;
    let view_model = DetailViewModel::new(&state.repo, date);

    view_model
        .weather
        .current()
        .await?
        .map(|entry| Json(entry.into()))
        .ok_or_else(|| AppError::NotFound(format!("No forecast for {}", date)))
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(StatusResponse {
        today: state.repo.today().to_string(),
        future_days: state.repo.count_future_days().await?,
        look_ahead_days: state.repo.num_days(),
        fetch_needed: state.repo.is_fetch_needed().await?,
    }))
}

pub async fn request_sync(State(state): State<AppState>) -> StatusCode {
    state.repo.start_fetch_weather_service();
    StatusCode::ACCEPTED
}
