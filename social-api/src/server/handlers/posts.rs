use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use social_shared::types::{
    CommentView, LikeOutcome, LikeView, Paginated, PostFilter, PostId, PostOrdering, PostUpdate,
    PostView, UserId,
};

use super::PageParams;
use crate::errors::ApiError;
use crate::server::auth::{AuthUser, MaybeAuthUser};
use crate::server::state::AppState;

/// `GET /posts` query: pagination plus `author`, `search` and `ordering`.
#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub author: Option<UserId>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(alias = "content")]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    #[serde(alias = "content")]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(alias = "content")]
    pub body: String,
}

/// GET /posts
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeAuthUser(viewer_id): MaybeAuthUser,
    Query(params): Query<PostListParams>,
) -> Result<Json<Paginated<PostView>>, ApiError> {
    let page = state.service.page_request(params.page, params.page_size)?;
    let ordering = match params.ordering.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw
            .parse::<PostOrdering>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        _ => PostOrdering::default(),
    };
    let filter = PostFilter {
        author: params.author,
        search: params.search,
        ordering,
    };

    Ok(Json(
        state.service.list_posts(viewer_id, filter, page).await?,
    ))
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let post = state
        .service
        .create_post(author_id, payload.title, payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    MaybeAuthUser(viewer_id): MaybeAuthUser,
    Path(post_id): Path<PostId>,
) -> Result<Json<PostView>, ApiError> {
    Ok(Json(state.service.get_post(viewer_id, post_id).await?))
}

/// PATCH /posts/:id
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(post_id): Path<PostId>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostView>, ApiError> {
    let update = PostUpdate {
        title: payload.title,
        body: payload.body,
    };
    Ok(Json(
        state.service.update_post(actor_id, post_id, update).await?,
    ))
}

/// DELETE /posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(post_id): Path<PostId>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_post(actor_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/:id/like
pub async fn like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
) -> Result<Json<LikeOutcome>, ApiError> {
    Ok(Json(state.service.like(user_id, post_id).await?))
}

/// POST /posts/:id/unlike
pub async fn unlike(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
) -> Result<Json<LikeOutcome>, ApiError> {
    Ok(Json(state.service.unlike(user_id, post_id).await?))
}

/// POST /posts/:id/toggle-like
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
) -> Result<Json<LikeOutcome>, ApiError> {
    Ok(Json(state.service.toggle_like(user_id, post_id).await?))
}

/// GET /posts/:id/likes
pub async fn list_likes(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<LikeView>>, ApiError> {
    let page = params.resolve(&state)?;
    Ok(Json(state.service.list_likes(post_id, page).await?))
}

/// GET /posts/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<CommentView>>, ApiError> {
    let page = params.resolve(&state)?;
    Ok(Json(state.service.list_comments(post_id, page).await?))
}

/// POST /posts/:id/comments
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Path(post_id): Path<PostId>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let comment = state
        .service
        .add_comment(author_id, post_id, payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
