use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::job_run_queries;
use crate::errors::AppError;
use crate::middleware::validated::ValidPath;
use crate::models::{ApiResponse, JobRun};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recent", get(recent_job_runs))
        .route("/:job_name/history", get(job_history))
}

/// GET /jobs/recent - Last 50 runs across every job
async fn recent_job_runs(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<JobRun>>>, AppError> {
    let runs = job_run_queries::fetch_recent(&state.pool, 50).await?;
    Ok(Json(ApiResponse::ok(runs)))
}

/// GET /jobs/:job_name/history - Last 100 runs of one job
async fn job_history(
    State(state): State<AppState>,
    ValidPath(job_name): ValidPath<String>,
) -> Result<Json<ApiResponse<Vec<JobRun>>>, AppError> {
    let runs = job_run_queries::fetch_for_job(&state.pool, &job_name, 100).await?;
    Ok(Json(ApiResponse::ok(runs)))
}
