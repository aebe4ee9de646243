use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::job::{Job, JobFilters, JobStatus};
use crate::models::offer::UserJobOffer;
use crate::routes::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<JobFilters>,
) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = state.jobs.list_jobs(&filters).await?;
    Ok(Json(jobs))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state.jobs.find_job(id).await?;
    Ok(Json(job))
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub job_id: Uuid,
    pub queued: bool,
}

/// Queue a `raw` job for enrichment. The outcome is observed by polling the job.
pub async fn process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    let job = state.jobs.find_job(id).await?;
    if job.status() != JobStatus::Raw {
        return Err(AppError::InvalidTransition {
            from: job.status(),
            to: JobStatus::Processing,
        });
    }
    let queued = state.jobs.enqueue(id);
    Ok((
        StatusCode::ACCEPTED,
        Json(ProcessResponse { job_id: id, queued }),
    ))
}

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub offer: String,
}

pub async fn generate_offer(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = state
        .jobs
        .generate_offer(id, user_id, &state.shutdown)
        .await?;
    Ok(Json(OfferResponse { offer }))
}

pub async fn get_offer(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserJobOffer>, AppError> {
    let offer = state.jobs.find_offer(id, user_id).await?;
    Ok(Json(offer))
}
