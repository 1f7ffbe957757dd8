//! Analyst directory endpoint.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use signalhub_common::AppResult;
use signalhub_core::{AnalystEntry, AnalystFollowStatus, parse_include_status};

use super::users::UserSummary;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Listing query.
#[derive(Debug, Default, Deserialize)]
pub struct AnalystsQuery {
    /// `1`, `true` or `yes` to add the caller's follow status per analyst.
    pub include_status: Option<String>,
}

/// One analyst of the listing.
#[derive(Serialize)]
pub struct AnalystResponse {
    #[serde(flatten)]
    pub user: UserSummary,
    pub followers_count: u64,
    pub signals_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_status: Option<AnalystFollowStatus>,
}

impl From<AnalystEntry> for AnalystResponse {
    fn from(entry: AnalystEntry) -> Self {
        Self {
            user: entry.user.into(),
            followers_count: entry.followers_count,
            signals_count: entry.signals_count,
            follow_status: entry.follow_status,
        }
    }
}

/// Analyst listing.
#[derive(Serialize)]
pub struct AnalystsResponse {
    pub count: usize,
    pub analysts: Vec<AnalystResponse>,
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnalystsQuery>,
) -> AppResult<ApiResponse<AnalystsResponse>> {
    let include_status = parse_include_status(query.include_status.as_deref());
    let entries = state.analyst_service.list(&user.id, include_status).await?;

    Ok(ApiResponse::ok(AnalystsResponse {
        count: entries.len(),
        analysts: entries.into_iter().map(Into::into).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/analysts", get(list))
}
