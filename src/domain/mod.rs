//! Domain types for the forecast cache.
//!
//! This module provides:
//! - `NormalizedDate`, the day-granular UTC row key
//! - `Clock` for reading "today"
//! - `WeatherEntry` and its list projection `ListWeatherEntry`

pub mod date;
pub mod weather;

pub use date::{Clock, DateParseError, FixedClock, NormalizedDate, SystemClock, DAY_IN_MILLIS};
pub use weather::{ListWeatherEntry, WeatherEntry};
