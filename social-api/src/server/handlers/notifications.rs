use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use social_shared::types::{NotificationCounts, NotificationId, NotificationView, Paginated};

use crate::errors::ApiError;
use crate::server::auth::AuthUser;
use crate::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    #[serde(alias = "notification_ids")]
    pub ids: Vec<NotificationId>,
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool {
    true
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Query(params): Query<NotificationListParams>,
) -> Result<Json<Paginated<NotificationView>>, ApiError> {
    let page = state.service.page_request(params.page, params.page_size)?;
    Ok(Json(
        state
            .service
            .list_notifications(viewer_id, params.unread, page)
            .await?,
    ))
}

/// GET /notifications/counts
pub async fn counts(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<NotificationCounts>, ApiError> {
    Ok(Json(state.service.notification_counts(viewer_id).await?))
}

/// POST /notifications/mark-read
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Json(payload): Json<MarkReadRequest>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .service
        .mark_read(viewer_id, &payload.ids, payload.read)
        .await?;
    Ok(Json(json!({
        "message": format!("{updated} notification(s) updated"),
        "updated": updated,
        "read": payload.read
    })))
}

/// POST /notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let updated = state.service.mark_all_read(viewer_id).await?;
    Ok(Json(json!({
        "message": format!("All {updated} notification(s) marked as read"),
        "updated": updated
    })))
}

/// POST /notifications/:id/toggle-read
pub async fn toggle_read(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Path(notification_id): Path<NotificationId>,
) -> Result<Json<Value>, ApiError> {
    let is_read = state.service.toggle_read(viewer_id, notification_id).await?;
    let status = if is_read {
        "marked as read"
    } else {
        "marked as unread"
    };
    Ok(Json(json!({
        "message": format!("Notification {status}"),
        "is_read": is_read
    })))
}
