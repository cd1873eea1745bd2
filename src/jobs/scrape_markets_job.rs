//! Market Scrape Background Job
//!
//! Runs every 15 minutes by default (`SCRAPE_SCHEDULE`). Exchange rates are
//! scraped first and every stored asset is repriced with them, then the other
//! markets are scraped concurrently and upserted in batches.
//!
//! A failing market does not fail the job; it is counted in `items_failed`.
//! The job only fails when no market could be stored at all.

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use tracing::{info, warn};

pub const JOB_NAME: &str = "scrape_markets";

pub async fn scrape_all_markets(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("🕷️ Scheduled scrape of all markets...");

    let summary = match ctx.scraping.run_all().await {
        Ok(summary) => summary,
        Err(AppError::Conflict(msg)) => {
            warn!("Scheduled scrape skipped: {}", msg);
            return Ok(JobResult {
                items_processed: 0,
                items_failed: 0,
            });
        }
        Err(e) => return Err(e),
    };

    let failed = summary.failed_markets();
    if failed == summary.markets.len() {
        let first_error = summary
            .markets
            .iter()
            .find_map(|m| m.error.clone())
            .unwrap_or_else(|| "every upsert batch failed".to_string());
        return Err(AppError::External(format!("All markets failed: {}", first_error)));
    }

    Ok(JobResult {
        items_processed: summary.upserted() as i32,
        items_failed: failed as i32,
    })
}
