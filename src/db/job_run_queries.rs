use sqlx::PgPool;
use uuid::Uuid;

use crate::models::JobRun;

const JOB_RUN_COLUMNS: &str = "id, job_name, status, started_at, completed_at, items_processed, \
     items_failed, duration_ms, error_message";

pub async fn record_start(pool: &PgPool, job_name: &str) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO job_runs (job_name, status) VALUES ($1, 'running') RETURNING id",
    )
    .bind(job_name)
    .fetch_one(pool)
    .await
}

pub async fn record_success(
    pool: &PgPool,
    id: Uuid,
    items_processed: i32,
    items_failed: i32,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_runs
         SET completed_at = NOW(), status = 'success',
             items_processed = $2, items_failed = $3, duration_ms = $4
         WHERE id = $1",
    )
    .bind(id)
    .bind(items_processed)
    .bind(items_failed)
    .bind(duration_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_failure(
    pool: &PgPool,
    id: Uuid,
    error_message: &str,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_runs
         SET completed_at = NOW(), status = 'failed', error_message = $2, duration_ms = $3
         WHERE id = $1",
    )
    .bind(id)
    .bind(error_message)
    .bind(duration_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_skipped(pool: &PgPool, job_name: &str, reason: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO job_runs (job_name, status, completed_at, duration_ms, error_message)
         VALUES ($1, 'skipped', NOW(), 0, $2)",
    )
    .bind(job_name)
    .bind(reason)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_recent(pool: &PgPool, limit: i64) -> Result<Vec<JobRun>, sqlx::Error> {
    sqlx::query_as::<_, JobRun>(&format!(
        "SELECT {} FROM job_runs ORDER BY started_at DESC LIMIT $1",
        JOB_RUN_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn fetch_for_job(pool: &PgPool, job_name: &str, limit: i64) -> Result<Vec<JobRun>, sqlx::Error> {
    sqlx::query_as::<_, JobRun>(&format!(
        "SELECT {} FROM job_runs WHERE job_name = $1 ORDER BY started_at DESC LIMIT $2",
        JOB_RUN_COLUMNS
    ))
    .bind(job_name)
    .bind(limit)
    .fetch_all(pool)
    .await
}
