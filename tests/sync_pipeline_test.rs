use axum::http::StatusCode;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use sunshine::datasource::{DataSourceError, MockDataSource};
use sunshine::domain::{FixedClock, NormalizedDate, WeatherEntry};
use sunshine::{api, Config, DetailViewModel, Injector, MainViewModel};
use tempfile::TempDir;
use tokio_test::assert_ok;
use tower::util::ServiceExt;

fn today() -> NormalizedDate {
    NormalizedDate::from_ymd(2025, 3, 20).unwrap()
}

fn forecast(days: i64) -> Vec<WeatherEntry> {
    (0..days)
        .map(|i| {
            WeatherEntry::new(
                800,
                today().add_days(i),
                1.0,
                9.0 + i as f64,
                40.0,
                1020.0,
                3.0,
                0.0,
            )
        })
        .collect()
}

fn injector(temp_dir: &TempDir, source: MockDataSource) -> (Injector, Arc<MockDataSource>) {
    let mut env = HashMap::new();
    env.insert(
        "DATABASE_PATH".to_string(),
        temp_dir.path().join("sync.db").to_string_lossy().to_string(),
    );
    env.insert("FORECAST_DAYS".to_string(), "5".to_string());
    let config = Config::from_env_map(env).unwrap();

    let source = Arc::new(source);
    let injector = Injector::new(config)
        .with_source(source.clone())
        .with_clock(Arc::new(FixedClock(today())));
    (injector, source)
}

#[tokio::test]
async fn test_first_read_triggers_single_sync_and_emits_rows() {
    let temp_dir = TempDir::new().unwrap();
    let (injector, source) = injector(&temp_dir, MockDataSource::new().with_entries(forecast(5)));
    let repo = assert_ok!(injector.repository().await);

    let view_model = MainViewModel::new(&repo);
    let mut updates = Box::pin(view_model.forecast.clone().into_stream());

    let rows = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let rows = updates.next().await.unwrap().unwrap();
            if rows.len() == 5 {
                break rows;
            }
        }
    })
    .await
    .expect("forecast never reached the view-model");

    assert_eq!(rows[0].date, today());
    assert_eq!(rows[4].max, 13.0);
    assert!(!repo.is_fetch_needed().await.unwrap());

    let _ = MainViewModel::new(&repo);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_sync_endpoint_refreshes_cache() {
    let temp_dir = TempDir::new().unwrap();
    let mock = MockDataSource::new()
        .with_response(Err(DataSourceError::RateLimited))
        .with_entries(forecast(3));
    let (injector, source) = injector(&temp_dir, mock);
    let repo = injector.repository().await.unwrap();
    let app = api::create_router(api::AppState { repo: repo.clone() });

    // First read consumes the scripted failure; nothing is cached.
    assert!(repo.initialize_data());
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.fetch_count() < 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(repo.count_future_days().await.unwrap(), 0);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/sync")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    tokio::time::timeout(Duration::from_secs(5), async {
        while repo.count_future_days().await.unwrap() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("sync did not populate the cache");
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_cleanup_removes_rows_before_today() {
    let temp_dir = TempDir::new().unwrap();
    let (injector, _) = injector(&temp_dir, MockDataSource::new());
    let dao = injector.dao().await.unwrap();
    let repo = injector.repository().await.unwrap();

    let mut rows = forecast(2);
    rows.push(WeatherEntry::new(600, today().add_days(-1), 0.0, 1.0, 90.0, 990.0, 8.0, 20.0));
    rows.push(WeatherEntry::new(600, today().add_days(-7), 0.0, 1.0, 90.0, 990.0, 8.0, 20.0));
    dao.bulk_insert(&rows).await.unwrap();

    assert_eq!(repo.delete_old_data().await.unwrap(), 2);
    assert_eq!(
        dao.count_all_future_weather(today().add_days(-30)).await.unwrap(),
        2
    );
    assert_eq!(repo.delete_old_data().await.unwrap(), 0);
}

#[tokio::test]
async fn test_view_models_built_off_runtime_start_sync() {
    let temp_dir = TempDir::new().unwrap();
    let (injector, source) = injector(&temp_dir, MockDataSource::new().with_entries(forecast(4)));
    let repo = assert_ok!(injector.repository().await);

    let ui_repo = repo.clone();
    let (main, detail) = std::thread::spawn(move || {
        let main = MainViewModel::new(&ui_repo);
        let detail = DetailViewModel::new(&ui_repo, today().add_days(2));
        (main, detail)
    })
    .join()
    .expect("building view-models off the runtime panicked");

    tokio::time::timeout(Duration::from_secs(5), async {
        while repo.count_future_days().await.unwrap() < 4 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("sync requested from a plain thread never ran");

    assert_eq!(main.forecast.current().await.unwrap().len(), 4);
    let day = detail.weather.current().await.unwrap().unwrap();
    assert_eq!(day.date, today().add_days(2));
    assert_eq!(source.fetch_count(), 1);
}
