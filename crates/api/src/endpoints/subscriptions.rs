//! Subscription endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use signalhub_common::AppResult;
use signalhub_core::{CancelOutcome, SubscribeInput};
use signalhub_db::entities::subscription::{self, PlanType, SubscriptionStatus};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Subscription response, evaluated at the time of the request.
#[derive(Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub user_id: String,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub start_date: String,
    pub end_date: String,
    pub is_trial: bool,
    pub is_active: bool,
    pub days_remaining: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl SubscriptionResponse {
    fn at(s: subscription::Model, now: DateTime<FixedOffset>) -> Self {
        Self {
            is_active: s.is_active_at(now),
            days_remaining: s.days_remaining_at(now),
            id: s.id,
            user_id: s.user_id,
            plan_type: s.plan_type,
            status: s.status,
            start_date: s.start_date.to_rfc3339(),
            end_date: s.end_date.to_rfc3339(),
            is_trial: s.is_trial,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<subscription::Model> for SubscriptionResponse {
    fn from(s: subscription::Model) -> Self {
        Self::at(s, Utc::now().fixed_offset())
    }
}

/// Subscription with a human-readable note.
#[derive(Serialize)]
pub struct SubscriptionActionResponse {
    pub message: String,
    pub subscription: SubscriptionResponse,
}

/// Current subscription; a free trial is started on first access.
async fn status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SubscriptionResponse>> {
    let sub = state.subscription_service.status(&user.id).await?;
    Ok(ApiResponse::ok(sub.into()))
}

/// Buy a monthly or yearly plan.
async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubscribeInput>,
) -> AppResult<ApiResponse<SubscriptionActionResponse>> {
    let sub = state.subscription_service.subscribe(&user.id, &input).await?;

    let plan = match input.plan_type {
        PlanType::Yearly => "yearly",
        _ => "monthly",
    };

    Ok(ApiResponse::ok(SubscriptionActionResponse {
        message: format!("Successfully subscribed to {plan} plan."),
        subscription: sub.into(),
    }))
}

/// Cancel the subscription.
async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SubscriptionActionResponse>> {
    let (message, sub) = match state.subscription_service.cancel(&user.id).await? {
        CancelOutcome::Cancelled(sub) => ("Subscription cancelled successfully.", sub),
        CancelOutcome::AlreadyCancelled(sub) => ("Subscription is already cancelled.", sub),
    };

    Ok(ApiResponse::ok(SubscriptionActionResponse {
        message: message.to_string(),
        subscription: sub.into(),
    }))
}

/// Result of the subscription check.
#[derive(Serialize)]
pub struct CheckResponse {
    pub has_active_subscription: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

async fn check(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CheckResponse>> {
    let (active, sub) = state
        .subscription_service
        .check(&user.id, user.is_subscribed)
        .await?;

    let message = sub.is_none().then(|| {
        "No subscription found. Free trial will be created on first access.".to_string()
    });

    Ok(ApiResponse::ok(CheckResponse {
        has_active_subscription: active,
        subscription: sub.map(Into::into),
        message,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/subscribe", post(subscribe))
        .route("/cancel", post(cancel))
        .route("/check", get(check))
}
