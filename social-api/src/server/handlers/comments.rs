use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use social_shared::types::{CommentId, CommentUpdate, CommentView};

use crate::errors::ApiError;
use crate::server::auth::AuthUser;
use crate::server::state::AppState;

/// PATCH /comments/:id
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(comment_id): Path<CommentId>,
    Json(update): Json<CommentUpdate>,
) -> Result<Json<CommentView>, ApiError> {
    Ok(Json(
        state
            .service
            .update_comment(actor_id, comment_id, update)
            .await?,
    ))
}

/// DELETE /comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(comment_id): Path<CommentId>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_comment(actor_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
