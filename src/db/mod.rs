//! Database module for the local forecast cache.
//!
//! This module provides:
//! - Database initialization and schema versioning
//! - `WeatherDao`, the accessor for forecast rows
//! - `LiveQuery`, query handles that re-run on every committed write

pub mod dao;
pub mod live;
pub mod migrations;

pub use dao::WeatherDao;
pub use live::LiveQuery;
pub use migrations::init_db;
