//! # Office Hours API
//!
//! The web server for the office-hours booking service: registration and
//! login, professor slot publishing, and student appointment booking and
//! cancellation.
//!
//! ## Architecture
//!
//! - **Routes**: API endpoints and URL structure
//! - **Handlers**: request parsing and response shaping; the rules live in
//!   `officehours-core`
//! - **Middleware**: authentication and error mapping
//! - **Config**: environment configuration
//!
//! Handlers only ever talk to the datastore through the [`Store`] trait, so
//! the same router runs over Postgres in production and over the in-memory
//! store in tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Authentication and error handling
pub mod middleware;
/// Route definitions
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method},
    BoxError, Router,
};
use eyre::{eyre, Result};
use officehours_core::{
    booking::BookingCoordinator,
    cancellation::CancellationCoordinator,
    errors::BookingError,
    ledger::Store,
    notify::{spawn_worker, LogMailer, NotificationQueue},
    query::QueryService,
    slots::SlotDesk,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::middleware::error_handling::AppError;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub store: Arc<dyn Store>,
    pub booking: BookingCoordinator<dyn Store>,
    pub cancellation: CancellationCoordinator<dyn Store>,
    pub queries: QueryService<dyn Store>,
    pub slots: SlotDesk<dyn Store>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn Store>,
        notifications: NotificationQueue,
        jwt_secret: impl Into<String>,
        jwt_ttl_hours: i64,
    ) -> Self {
        Self {
            booking: BookingCoordinator::new(Arc::clone(&store), notifications.clone()),
            cancellation: CancellationCoordinator::new(Arc::clone(&store), notifications),
            queries: QueryService::new(Arc::clone(&store)),
            slots: SlotDesk::new(Arc::clone(&store)),
            store,
            jwt_secret: jwt_secret.into(),
            jwt_ttl_hours,
        }
    }
}

/// Builds the router with every endpoint and request tracing.
pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::users::routes())
        .merge(routes::slots::routes())
        .merge(routes::appointments::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Timeouts report as `Unavailable` through the same mapping as every other error.
async fn handle_timeout_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError(BookingError::Unavailable(eyre!("request timed out")))
    } else {
        AppError(BookingError::Internal(err))
    }
}

/// Wraps `router` so requests running longer than `timeout` are cut off.
pub fn with_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_timeout_error))
            .timeout(timeout),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Starts the API server over `store`
///
/// Installs the log subscriber, spawns the notification worker, wires the
/// router and serves until the listener fails.
pub async fn start_server(config: config::ApiConfig, store: Arc<dyn Store>) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (notifications, _worker) =
        spawn_worker(Arc::new(LogMailer), config.notification_queue_capacity);

    let state = Arc::new(ApiState::new(
        store,
        notifications,
        config.jwt_secret.clone(),
        config.jwt_ttl_hours,
    ));

    let app = app(state);

    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    let app = with_timeout(app, Duration::from_secs(config.request_timeout));

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
