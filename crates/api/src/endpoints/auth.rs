//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use signalhub_common::AppResult;
use signalhub_core::CreateUserInput;
use signalhub_db::entities::user::UserRole;

use crate::{middleware::AppState, response::ApiResponse};

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<UserRole>,
}

/// Credentials returned by signup and signin.
#[derive(Serialize)]
pub struct SignupResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_subscribed: bool,
    pub token: String,
}

/// Create a new user account.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let input = CreateUserInput {
        username: req.username,
        email: req.email,
        password: req.password,
        name: req.name,
        avatar_url: req.avatar_url,
        role: req.role.unwrap_or(UserRole::Trader),
    };

    let user = state.user_service.create(input).await?;

    Ok(ApiResponse::created(SignupResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        is_subscribed: user.is_subscribed,
        token: user.token.unwrap_or_default(),
    }))
}

/// Signin request.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Sign in to an existing account and get its token back.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let user = state
        .user_service
        .authenticate(&req.email, &req.password)
        .await?;

    Ok(ApiResponse::ok(SignupResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        is_subscribed: user.is_subscribed,
        token: user.token.unwrap_or_default(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}
