//! Signalhub server entry point.

use std::sync::Arc;

use axum::{Router, middleware};
use signalhub_api::{
    middleware::{AppState, auth_middleware},
    router as api_router,
};
use signalhub_common::Config;
use signalhub_core::{
    AnalystService, FollowService, MutingService, RelationshipService, SignalService,
    SubscriptionService, UserService,
};
use signalhub_db::repositories::{
    FollowRepository, MuteRepository, SubscriptionRepository, TradingSignalRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signalhub=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting signalhub server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(signalhub_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    signalhub_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));
    let mute_repo = MuteRepository::new(Arc::clone(&db));
    let signal_repo = TradingSignalRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));

    // Initialize services
    let subscription_service = SubscriptionService::new(
        subscription_repo,
        user_repo.clone(),
        config.platform.trial_days,
    );
    let user_service = UserService::new(user_repo.clone(), subscription_service.clone());
    let follow_service = FollowService::new(follow_repo.clone(), user_repo.clone());
    let muting_service = MutingService::new(mute_repo.clone(), user_repo.clone());
    let relationship_service =
        RelationshipService::new(follow_repo.clone(), mute_repo, user_repo.clone());
    let analyst_service = AnalystService::new(
        user_repo,
        follow_repo,
        signal_repo.clone(),
        config.platform.analysts_limit,
    );
    let signal_service = SignalService::new(signal_repo);

    let state = AppState {
        user_service,
        follow_service,
        muting_service,
        relationship_service,
        analyst_service,
        signal_service,
        subscription_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(addr = %addr, url = %config.server.url, "Listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
