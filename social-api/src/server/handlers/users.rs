use axum::{
    extract::{Path, Query, State},
    Json,
};
use social_shared::types::{Paginated, User, UserId, UserProfile, UserUpdate};

use super::PageParams;
use crate::errors::ApiError;
use crate::server::auth::AuthUser;
use crate::server::state::AppState;

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<UserProfile>>, ApiError> {
    let page = params.resolve(&state)?;
    Ok(Json(state.service.list_users(Some(viewer_id), page).await?))
}

/// GET /users/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.service.get_profile(Some(user_id), user_id).await?))
}

/// PATCH /users/me
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.service.update_profile(user_id, update).await?))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(viewer_id): AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(
        state.service.get_profile(Some(viewer_id), user_id).await?,
    ))
}

/// GET /users/:id/followers
pub async fn followers(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(user_id): Path<UserId>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<User>>, ApiError> {
    let page = params.resolve(&state)?;
    Ok(Json(state.service.list_followers(user_id, page).await?))
}

/// GET /users/:id/following
pub async fn following(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(user_id): Path<UserId>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<User>>, ApiError> {
    let page = params.resolve(&state)?;
    Ok(Json(state.service.list_following(user_id, page).await?))
}
