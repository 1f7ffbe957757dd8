//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use signalhub_core::{
    AnalystService, FollowService, MutingService, RelationshipService, SignalService,
    SubscriptionService, UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub follow_service: FollowService,
    pub muting_service: MutingService,
    pub relationship_service: RelationshipService,
    pub analyst_service: AnalystService,
    pub signal_service: SignalService,
    pub subscription_service: SubscriptionService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` into the caller's user model.
/// Requests without a valid token pass through unauthenticated; endpoints
/// that need a caller reject them through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Token lookup failed");
            }
            Err(_) => {
                tracing::debug!("Rejected bearer token");
            }
        }
    }

    next.run(req).await
}
