//! Data access for the `weather` table.

use super::live::{LiveQuery, QueryFn};
use crate::domain::{ListWeatherEntry, NormalizedDate, WeatherEntry};
use futures::FutureExt;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Accessor for persisted forecast rows.
///
/// Every committed write bumps a change counter that [`LiveQuery`] handles
/// created from this DAO are subscribed to.
#[derive(Debug, Clone)]
pub struct WeatherDao {
    pool: SqlitePool,
    changes: Arc<watch::Sender<u64>>,
}

impl WeatherDao {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            pool,
            changes: Arc::new(changes),
        }
    }

    /// Simplified rows dated on or after `date`, oldest first, kept live.
    pub fn get_current_weather_forecasts(
        &self,
        date: NormalizedDate,
    ) -> LiveQuery<Vec<ListWeatherEntry>> {
        let pool = self.pool.clone();
        let run: QueryFn<Vec<ListWeatherEntry>> = Arc::new(move || {
            let pool = pool.clone();
            async move { select_current_forecasts(&pool, date).await }.boxed()
        });
        LiveQuery::new(self.changes.subscribe(), run)
    }

    /// The row for exactly `date`, kept live.
    pub fn get_weather_by_date(&self, date: NormalizedDate) -> LiveQuery<Option<WeatherEntry>> {
        let pool = self.pool.clone();
        let run: QueryFn<Option<WeatherEntry>> = Arc::new(move || {
            let pool = pool.clone();
            async move { select_weather_by_date(&pool, date).await }.boxed()
        });
        LiveQuery::new(self.changes.subscribe(), run)
    }

    pub async fn query_current_forecasts(
        &self,
        date: NormalizedDate,
    ) -> Result<Vec<ListWeatherEntry>, sqlx::Error> {
        select_current_forecasts(&self.pool, date).await
    }

    pub async fn query_weather_by_date(
        &self,
        date: NormalizedDate,
    ) -> Result<Option<WeatherEntry>, sqlx::Error> {
        select_weather_by_date(&self.pool, date).await
    }

    /// Upsert a batch of rows keyed on `date` in a single transaction.
    ///
    /// Returns the number of rows written. An empty batch touches nothing and
    /// does not wake observers.
    pub async fn bulk_insert(&self, entries: &[WeatherEntry]) -> Result<u64, sqlx::Error> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO weather (
                    weather_icon_id, date, min, max, humidity, pressure, wind, degrees
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(date) DO UPDATE SET
                    weather_icon_id = excluded.weather_icon_id,
                    min = excluded.min,
                    max = excluded.max,
                    humidity = excluded.humidity,
                    pressure = excluded.pressure,
                    wind = excluded.wind,
                    degrees = excluded.degrees
                "#,
            )
            .bind(entry.weather_icon_id)
            .bind(entry.date.as_millis())
            .bind(entry.min)
            .bind(entry.max)
            .bind(entry.humidity)
            .bind(entry.pressure)
            .bind(entry.wind)
            .bind(entry.degrees)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        debug!(rows = written, "Weather rows upserted");
        self.notify();
        Ok(written)
    }

    /// Delete every row dated strictly before `date`.
    pub async fn delete_old_weather(&self, date: NormalizedDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM weather WHERE date < ?")
            .bind(date.as_millis())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            self.notify();
        }
        Ok(deleted)
    }

    /// Number of rows dated on or after `date`.
    pub async fn count_all_future_weather(&self, date: NormalizedDate) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM weather WHERE date >= ?")
            .bind(date.as_millis())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

// Live queries capture only the pool, never the change sender, so dropping
// the last `WeatherDao` ends their change feed.
async fn select_current_forecasts(
    pool: &SqlitePool,
    date: NormalizedDate,
) -> Result<Vec<ListWeatherEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, weather_icon_id, date, min, max
        FROM weather
        WHERE date >= ?
        ORDER BY date ASC
        "#,
    )
    .bind(date.as_millis())
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(list_entry_from_row).collect())
}

async fn select_weather_by_date(
    pool: &SqlitePool,
    date: NormalizedDate,
) -> Result<Option<WeatherEntry>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, weather_icon_id, date, min, max, humidity, pressure, wind, degrees
        FROM weather
        WHERE date = ?
        "#,
    )
    .bind(date.as_millis())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(entry_from_row))
}

fn list_entry_from_row(row: &SqliteRow) -> ListWeatherEntry {
    ListWeatherEntry {
        id: row.get("id"),
        weather_icon_id: row.get("weather_icon_id"),
        date: NormalizedDate::from_millis(row.get("date")),
        min: row.get("min"),
        max: row.get("max"),
    }
}

fn entry_from_row(row: &SqliteRow) -> WeatherEntry {
    WeatherEntry {
        id: Some(row.get("id")),
        weather_icon_id: row.get("weather_icon_id"),
        date: NormalizedDate::from_millis(row.get("date")),
        min: row.get("min"),
        max: row.get("max"),
        humidity: row.get("humidity"),
        pressure: row.get("pressure"),
        wind: row.get("wind"),
        degrees: row.get("degrees"),
    }
}
