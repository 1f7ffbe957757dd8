//! API endpoints.

mod analysts;
mod auth;
mod blocking;
mod following;
mod muting;
mod signals;
mod subscriptions;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(analysts::router())
        .nest("/users", users::router())
        .nest("/following", following::router())
        .nest("/blocking", blocking::router())
        .nest("/mute", muting::router())
        .nest("/signals", signals::router())
        .nest("/subscriptions", subscriptions::router())
}
