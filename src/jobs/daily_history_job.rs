//! Daily History Background Job
//!
//! Runs at 23:59 by default (`HISTORY_SCHEDULE`) and copies every asset's
//! current price triple into a `histories` row for today. Assets that already
//! have a row for the day are left untouched, so re-running is harmless.

use crate::errors::AppError;
use crate::services::history_service;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::info;

pub const JOB_NAME: &str = "daily_history";

pub async fn record_daily_history(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("📸 Recording daily closing prices...");
    let written = history_service::snapshot_today(&ctx.pool).await?;

    Ok(JobResult {
        items_processed: written as i32,
        items_failed: 0,
    })
}
