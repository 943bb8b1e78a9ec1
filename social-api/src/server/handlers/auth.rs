use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use social_shared::types::{NewUser, Registration};

use crate::errors::ApiError;
use crate::server::auth::AuthUser;
use crate::server::state::AppState;

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let registration = state.service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let revoked = state.service.logout(user_id).await?;
    Ok(Json(json!({
        "message": "Successfully logged out.",
        "revoked": revoked
    })))
}
