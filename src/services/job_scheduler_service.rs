use crate::db::job_run_queries;
use crate::errors::AppError;
use crate::jobs::{daily_history_job, scrape_markets_job};
use crate::services::run_guard::RunGuard;
use crate::services::scraping_service::ScrapingService;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: PgPool,
    pub scraping: Arc<ScrapingService>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

/// Cron expressions for the recurring jobs (format: sec min hour day month weekday).
#[derive(Debug, Clone)]
pub struct JobSchedules {
    pub scrape_markets: String,
    pub daily_history: String,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self, schedules: &JobSchedules) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        self.schedule_job(
            &schedules.scrape_markets,
            scrape_markets_job::JOB_NAME,
            "Scrape every market and reprice assets",
            scrape_markets_job::scrape_all_markets,
        )
        .await?;

        self.schedule_job(
            &schedules.daily_history,
            daily_history_job::JOB_NAME,
            "Record each asset's closing price",
            daily_history_job::record_daily_history,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully with 2 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    /// Helper to schedule a job with tracking
    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);
        let running = Arc::new(AtomicBool::new(false));

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            let running = running.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, running, job_fn).await;
            })
        })
        .map_err(|e| AppError::Validation(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

// Job tracking wrapper. A tick that fires while the previous run of the same
// job is still going is recorded as skipped. The running flag is released
// even if the job panics.
pub async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    running: Arc<AtomicBool>,
    job_fn: Arc<F>,
) where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    let pool = context.pool.clone();

    let Some(guard) = RunGuard::acquire(&running) else {
        warn!("⏭️ Skipping job {}: previous run still in progress", job_name);
        if let Err(e) = job_run_queries::record_skipped(&pool, job_name, "previous run still in progress").await {
            error!("Failed to record skipped job: {}", e);
        }
        return;
    };

    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let job_id = match job_run_queries::record_start(&pool, job_name).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to record job start: {}", e);
            return;
        }
    };

    let result = job_fn(context).await;
    drop(guard);

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );

            if let Err(e) = job_run_queries::record_success(
                &pool,
                job_id,
                job_result.items_processed,
                job_result.items_failed,
                duration_ms,
            )
            .await
            {
                error!("Failed to record job success: {}", e);
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);

            if let Err(e) = job_run_queries::record_failure(&pool, job_id, &e.to_string(), duration_ms).await {
                error!("Failed to record job failure: {}", e);
            }
        }
    }
}
