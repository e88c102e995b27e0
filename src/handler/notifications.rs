use std::sync::Arc;

use axum::{
    extract::Query,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::{
    db::notificationdb::NotificationExt,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub fn notifications_handler() -> Router {
    Router::new().route("/", get(get_user_notifications))
}

pub async fn get_user_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination.limit.unwrap_or(20).min(100) as i64;
    let offset = ((page - 1) as i64) * limit;

    let notifications = app_state
        .db_client
        .get_user_notifications(auth.user.id, limit, offset)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": notifications
    })))
}
