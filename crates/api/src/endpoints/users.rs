//! Users endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use signalhub_common::AppResult;
use signalhub_core::{ChangePasswordInput, UpdateUserInput};
use signalhub_db::entities::user::{self, UserRole};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Minimal user shown inside relationship listings.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            role: user.role,
        }
    }
}

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_subscribed: bool,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at.to_rfc3339(),
            username: user.username,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            role: user.role,
            is_verified: user.is_verified,
            is_subscribed: user.is_subscribed,
        }
    }
}

/// Get current user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}

/// Update the caller's profile.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.update(&user.id, input).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.user_service.change_password(&user.id, input).await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Password changed successfully.",
    )))
}

/// Get a user by ID.
async fn show(
    AuthUser(_caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .route("/me/password", post(change_password))
        .route("/{id}", get(show))
}
