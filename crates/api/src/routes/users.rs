use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/users", post(handlers::users::register))
        .route("/api/users/login", post(handlers::users::login))
        .route("/api/users/:username", get(handlers::users::profile))
}
