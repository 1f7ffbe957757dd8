//! HTTP API layer for signalhub.
//!
//! - **Endpoints**: signup, social graph, analyst directory, trading signals
//!   and subscriptions, all under one router
//! - **Extractors**: the authenticated caller
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
