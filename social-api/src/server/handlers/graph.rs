use axum::{
    extract::{Path, Query, State},
    Json,
};
use social_shared::types::{FeedPage, FollowOutcome, UserId};

use super::PageParams;
use crate::errors::ApiError;
use crate::server::auth::AuthUser;
use crate::server::state::AppState;

/// POST /follow/:user_id
pub async fn follow(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(target_id): Path<UserId>,
) -> Result<Json<FollowOutcome>, ApiError> {
    Ok(Json(state.service.follow(actor_id, target_id).await?))
}

/// POST /unfollow/:user_id
pub async fn unfollow(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(target_id): Path<UserId>,
) -> Result<Json<FollowOutcome>, ApiError> {
    Ok(Json(state.service.unfollow(actor_id, target_id).await?))
}

/// GET /feed
pub async fn feed(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<FeedPage>, ApiError> {
    let page = params.resolve(&state)?;
    Ok(Json(state.service.get_feed(viewer_id, page).await?))
}
