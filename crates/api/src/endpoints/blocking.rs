//! Blocking endpoints.

use axum::{Json, Router, extract::State, routing::post};
use signalhub_common::AppResult;

use super::following::{FollowActionResponse, UserIdRequest};
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Block a user.
async fn block_user(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<FollowActionResponse>> {
    let (follow, _created) = state.follow_service.block(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(FollowActionResponse::new(
        "User blocked.",
        follow,
    )))
}

/// Unblock a user.
async fn unblock_user(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.follow_service.unblock(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("User unblocked.")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(block_user))
        .route("/delete", post(unblock_user))
}
