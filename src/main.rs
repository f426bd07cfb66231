use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use sunshine::{api, config::Config, Injector, PeriodicTask};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let sync_interval = config.sync_interval;
    let cleanup_interval = config.cleanup_interval;

    let injector = Injector::new(config);
    let repo = injector
        .repository()
        .await
        .context("failed to initialize weather database")?;
    let network = injector.network().await;

    // Background jobs live as long as these handles.
    let _sync = network.schedule_recurring_fetch_weather_sync(sync_interval);
    let cleanup_repo = Arc::clone(&repo);
    let _cleanup = PeriodicTask::spawn("stale-row-cleanup", cleanup_interval, move || {
        let repo = Arc::clone(&cleanup_repo);
        async move {
            if let Err(e) = repo.delete_old_data().await {
                tracing::error!(error = %e, "Failed to delete old weather data");
            }
        }
    });

    let app = api::create_router(api::AppState { repo: repo.clone() });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown requested");
        })
        .await
        .context("server error")?;

    repo.shutdown();
    Ok(())
}
