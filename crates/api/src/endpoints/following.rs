//! Following endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use signalhub_common::{AppError, AppResult};
use signalhub_core::{FollowWithUsers, RelationshipCounts, RelationshipStatus};
use signalhub_db::entities::follow::{self, FollowStatus};

use super::users::UserSummary;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Request naming the other user of a relationship.
#[derive(Debug, Deserialize)]
pub struct UserIdRequest {
    pub user_id: String,
}

/// Request naming a follow row.
#[derive(Debug, Deserialize)]
pub struct FollowIdRequest {
    pub follow_id: String,
}

/// Optional `?user_id=` query.
#[derive(Debug, Default, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

/// Follow row response.
#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub id: String,
    pub follower_id: String,
    pub followed_id: String,
    pub status: FollowStatus,
    pub is_active: bool,
    pub requested_at: Option<String>,
    pub accepted_at: Option<String>,
    pub rejected_at: Option<String>,
    pub unfollowed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follower_detail: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followed_detail: Option<UserSummary>,
}

impl From<follow::Model> for FollowResponse {
    fn from(f: follow::Model) -> Self {
        Self {
            id: f.id,
            follower_id: f.follower_id,
            followed_id: f.followed_id,
            status: f.status,
            is_active: f.is_active,
            requested_at: f.requested_at.map(|t| t.to_rfc3339()),
            accepted_at: f.accepted_at.map(|t| t.to_rfc3339()),
            rejected_at: f.rejected_at.map(|t| t.to_rfc3339()),
            unfollowed_at: f.unfollowed_at.map(|t| t.to_rfc3339()),
            follower_detail: None,
            followed_detail: None,
        }
    }
}

impl From<FollowWithUsers> for FollowResponse {
    fn from(row: FollowWithUsers) -> Self {
        Self {
            follower_detail: Some(row.follower.into()),
            followed_detail: Some(row.followed.into()),
            ..row.follow.into()
        }
    }
}

/// Outcome of a follow action.
#[derive(Debug, Serialize)]
pub struct FollowActionResponse {
    pub message: String,
    pub follow: FollowResponse,
}

impl FollowActionResponse {
    pub(crate) fn new(message: impl Into<String>, follow: follow::Model) -> Self {
        Self {
            message: message.into(),
            follow: follow.into(),
        }
    }
}

/// Send a follow request.
async fn request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<FollowActionResponse>> {
    let outcome = state
        .follow_service
        .send_request(&user.id, &req.user_id)
        .await?;

    let created = outcome.is_created();
    let body = FollowActionResponse::new(outcome.message(), outcome.into_follow());

    Ok(if created {
        ApiResponse::created(body)
    } else {
        ApiResponse::ok(body)
    })
}

/// Accept a follow request sent to the caller.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowIdRequest>,
) -> AppResult<ApiResponse<FollowActionResponse>> {
    let follow = state.follow_service.accept(&req.follow_id, &user.id).await?;
    Ok(ApiResponse::ok(FollowActionResponse::new(
        "Follow request accepted.",
        follow,
    )))
}

/// Reject a follow request sent to the caller.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FollowIdRequest>,
) -> AppResult<ApiResponse<FollowActionResponse>> {
    let follow = state.follow_service.reject(&req.follow_id, &user.id).await?;
    Ok(ApiResponse::ok(FollowActionResponse::new(
        "Follow request rejected.",
        follow,
    )))
}

/// Unfollow a user.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<FollowActionResponse>> {
    let follow = state.follow_service.unfollow(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(FollowActionResponse::new("Unfollowed.", follow)))
}

/// Followers listing.
#[derive(Serialize)]
pub struct FollowersResponse {
    pub count: usize,
    pub followers: Vec<UserSummary>,
}

/// Following listing.
#[derive(Serialize)]
pub struct FollowingResponse {
    pub count: usize,
    pub following: Vec<UserSummary>,
}

/// Pending requests received.
#[derive(Serialize)]
pub struct PendingReceivedResponse {
    pub count: usize,
    pub pending_requests: Vec<FollowResponse>,
}

/// Pending requests sent.
#[derive(Serialize)]
pub struct PendingSentResponse {
    pub count: usize,
    pub pending_sent: Vec<FollowResponse>,
}

/// Users following the caller, or `?user_id`.
async fn followers(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<FollowersResponse>> {
    let target = query.user_id.as_deref().unwrap_or(&user.id);
    let users = state.relationship_service.followers(target).await?;

    Ok(ApiResponse::ok(FollowersResponse {
        count: users.len(),
        followers: users.into_iter().map(Into::into).collect(),
    }))
}

/// Users the caller, or `?user_id`, follows.
async fn following(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<FollowingResponse>> {
    let target = query.user_id.as_deref().unwrap_or(&user.id);
    let users = state.relationship_service.following(target).await?;

    Ok(ApiResponse::ok(FollowingResponse {
        count: users.len(),
        following: users.into_iter().map(Into::into).collect(),
    }))
}

async fn pending_received(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PendingReceivedResponse>> {
    let rows = state.relationship_service.pending_received(&user.id).await?;

    Ok(ApiResponse::ok(PendingReceivedResponse {
        count: rows.len(),
        pending_requests: rows.into_iter().map(Into::into).collect(),
    }))
}

async fn pending_sent(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PendingSentResponse>> {
    let rows = state.relationship_service.pending_sent(&user.id).await?;

    Ok(ApiResponse::ok(PendingSentResponse {
        count: rows.len(),
        pending_sent: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Relationship counters of the caller, or of `?user_id`.
async fn counts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<RelationshipCounts>> {
    let counts = state
        .relationship_service
        .counts(&user.id, query.user_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(counts))
}

/// Relationship flags between the caller and `?user_id`.
#[derive(Serialize)]
pub struct StatusResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub status: RelationshipStatus,
}

async fn status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> AppResult<ApiResponse<StatusResponse>> {
    let Some(user_id) = query.user_id else {
        return Err(AppError::BadRequest("user_id is required.".to_string()));
    };

    let status = state.relationship_service.status(&user.id, &user_id).await?;

    Ok(ApiResponse::ok(StatusResponse { user_id, status }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(request))
        .route("/accept", post(accept))
        .route("/reject", post(reject))
        .route("/unfollow", post(unfollow))
        .route("/followers", get(followers))
        .route("/following", get(following))
        .route("/pending/received", get(pending_received))
        .route("/pending/sent", get(pending_sent))
        .route("/counts", get(counts))
        .route("/status", get(status))
}
