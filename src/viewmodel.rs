//! View-models: thin holders of the repository's live queries.

use crate::db::LiveQuery;
use crate::domain::{ListWeatherEntry, NormalizedDate, WeatherEntry};
use crate::repository::SunshineRepository;

/// Backs the forecast list screen.
#[derive(Debug, Clone)]
pub struct MainViewModel {
    pub forecast: LiveQuery<Vec<ListWeatherEntry>>,
}

impl MainViewModel {
    pub fn new(repository: &SunshineRepository) -> Self {
        Self {
            forecast: repository.get_current_weather_forecasts(),
        }
    }
}

/// Backs the single-day detail screen.
#[derive(Debug, Clone)]
pub struct DetailViewModel {
    pub date: NormalizedDate,
    pub weather: LiveQuery<Option<WeatherEntry>>,
}

impl DetailViewModel {
    pub fn new(repository: &SunshineRepository, date: NormalizedDate) -> Self {
        Self {
            date,
            weather: repository.get_weather_by_date(date),
        }
    }
}
