// handlers/jobs.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::jobdb::JobExt,
    dtos::jobdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::jobmodel::BidStatus,
    models::usermodel::UserRole,
    service::queries,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", post(create_job).get(search_jobs))
        .route("/mine", get(my_jobs))
        .route("/:job_id", get(get_job_details))
        .route("/:job_id/activate", put(activate_job))
        .route("/:job_id/close-bidding", put(close_bidding))
        .route("/:job_id/complete", put(complete_job))
        .route("/:job_id/cancel", put(cancel_job))
        .route("/:job_id/bids", post(submit_bid).get(get_job_bids))
        .route("/:job_id/bids/:bid_id/accept", put(accept_bid))
        .route("/:job_id/bids/:bid_id/reject", put(reject_bid))
}

pub fn bids_handler() -> Router {
    Router::new()
        .route("/mine", get(my_bids))
        .route("/:bid_id/withdraw", put(withdraw_bid))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if auth.user.role != UserRole::Customer {
        return Err(HttpError::forbidden("Only customers can post jobs"));
    }

    let job = app_state
        .lifecycle_service
        .create_job(auth.user.id, body)
        .await?;

    Ok(Json(ApiResponse::success("Job created", job)))
}

pub async fn search_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<SearchJobsDto>,
) -> Result<impl IntoResponse, HttpError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).min(100);
    let offset = ((page - 1) * limit) as i64;

    let jobs = app_state
        .db_client
        .list_jobs(
            params.category,
            params.status,
            params.urgency,
            limit as i64,
            offset,
        )
        .await?;

    Ok(Json(PaginatedResponse::new(jobs, page, limit)))
}

pub async fn my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.db_client.list_customer_jobs(auth.user.id).await?;

    Ok(Json(ApiResponse::success("Jobs retrieved", jobs)))
}

pub async fn get_job_details(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job(job_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    let bids = app_state.db_client.get_job_bids(job_id).await?;
    let now = Utc::now();

    let live_bids = bids
        .iter()
        .filter(|bid| matches!(bid.status, BidStatus::Pending | BidStatus::Accepted))
        .count();
    let time_remaining = queries::time_remaining(&job, now);

    let detail = JobDetailDto {
        bid_count: live_bids,
        average_bid: queries::average_bid_amount(&bids),
        winning_bid: queries::winning_bid(&bids).cloned(),
        bidding_open: queries::is_bidding_open(&job, now),
        countdown: time_remaining.to_string(),
        time_remaining,
        job,
    };

    Ok(Json(ApiResponse::success("Job retrieved", detail)))
}

pub async fn activate_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .lifecycle_service
        .activate_job(job_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Bidding opened", job)))
}

pub async fn close_bidding(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .lifecycle_service
        .close_bidding(job_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Bidding closed", job)))
}

pub async fn complete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .lifecycle_service
        .complete_job(job_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Job completed", job)))
}

pub async fn cancel_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .lifecycle_service
        .cancel_job(job_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Job cancelled", job)))
}

pub async fn submit_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<SubmitBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if auth.user.role != UserRole::Provider {
        return Err(HttpError::forbidden("Only providers can submit bids"));
    }

    let bid = app_state
        .lifecycle_service
        .submit_bid(job_id, auth.user.id, body)
        .await?;

    Ok(Json(ApiResponse::success("Bid submitted", bid)))
}

pub async fn get_job_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job(job_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    if job.customer_id != auth.user.id && !auth.user.role.is_staff() {
        return Err(HttpError::forbidden(
            "Only the job owner can view its bids",
        ));
    }

    let bids = app_state.db_client.get_job_bids(job_id).await?;

    Ok(Json(ApiResponse::success("Bids retrieved", bids)))
}

pub async fn accept_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((job_id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let (job, bid) = app_state
        .lifecycle_service
        .accept_bid(job_id, bid_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Bid accepted",
        AcceptBidResponseDto { job, bid },
    )))
}

pub async fn reject_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((job_id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state
        .lifecycle_service
        .reject_bid(job_id, bid_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Bid rejected", bid)))
}

pub async fn my_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let bids = app_state.db_client.get_provider_bids(auth.user.id).await?;

    Ok(Json(ApiResponse::success("Bids retrieved", bids)))
}

pub async fn withdraw_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state
        .lifecycle_service
        .withdraw_bid(bid_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Bid withdrawn", bid)))
}
