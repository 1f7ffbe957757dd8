//! Muting endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use signalhub_common::AppResult;
use signalhub_db::entities::mute;

use super::{following::UserIdRequest, users::UserSummary};
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Mute response.
#[derive(Serialize)]
pub struct MuteResponse {
    pub id: String,
    pub muter_id: String,
    pub muted_id: String,
    pub muted_at: String,
}

impl From<mute::Model> for MuteResponse {
    fn from(m: mute::Model) -> Self {
        Self {
            id: m.id,
            muter_id: m.muter_id,
            muted_id: m.muted_id,
            muted_at: m.muted_at.to_rfc3339(),
        }
    }
}

/// Outcome of a mute action.
#[derive(Serialize)]
pub struct MuteActionResponse {
    pub message: String,
    pub mute: MuteResponse,
}

/// Muted users listing.
#[derive(Serialize)]
pub struct MutedListResponse {
    pub count: usize,
    pub muted: Vec<UserSummary>,
}

/// Mute a user.
async fn mute_user(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<MuteActionResponse>> {
    let (mute, created) = state.muting_service.mute(&user.id, &req.user_id).await?;

    let message = if created {
        "User muted."
    } else {
        "User was already muted."
    };

    Ok(ApiResponse::ok(MuteActionResponse {
        message: message.to_string(),
        mute: mute.into(),
    }))
}

/// Unmute a user.
async fn unmute_user(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.muting_service.unmute(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("User unmuted.")))
}

/// Users the caller has muted, most recent first.
async fn list_muted(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MutedListResponse>> {
    let users = state.relationship_service.muted(&user.id).await?;

    Ok(ApiResponse::ok(MutedListResponse {
        count: users.len(),
        muted: users.into_iter().map(Into::into).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(mute_user))
        .route("/delete", post(unmute_user))
        .route("/list", get(list_muted))
}
