mod app;
mod config;
mod db;
mod errors;
mod external;
mod jobs;
mod logging;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::logging::LoggingConfig;
use crate::services::job_scheduler_service::{JobContext, JobSchedulerService, JobSchedules};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("🗄️ Database migrations applied");

    let port = config.port;
    let schedules = JobSchedules {
        scrape_markets: config.scrape_schedule.clone(),
        daily_history: config.history_schedule.clone(),
    };
    let scheduler_enabled = config.scheduler_enabled;

    let state = AppState::build(pool.clone(), config)?;

    // Kept alive for the lifetime of the server
    let _scheduler = if scheduler_enabled {
        let mut scheduler = JobSchedulerService::new(JobContext {
            pool,
            scraping: state.scraping.clone(),
        })
        .await?;
        scheduler.start(&schedules).await?;
        Some(scheduler)
    } else {
        tracing::info!("⏸️ Job scheduler disabled");
        None
    };

    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Assetfolio backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
