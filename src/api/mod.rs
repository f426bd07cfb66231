pub mod forecast;
pub mod health;

use crate::repository::SunshineRepository;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<SunshineRepository>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/forecast", get(forecast::get_forecast))
        .route("/v1/forecast/:date", get(forecast::get_weather_for_date))
        .route("/v1/status", get(forecast::get_status))
        .route("/v1/sync", post(forecast::request_sync))
        .layer(cors)
        .with_state(state)
}
