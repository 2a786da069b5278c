use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/appointments",
            post(handlers::appointments::book_appointment),
        )
        .route(
            "/api/appointments/:appointment_id/cancel",
            post(handlers::appointments::cancel_appointment),
        )
        .route(
            "/api/student/appointments",
            get(handlers::appointments::list_student_appointments),
        )
        .route(
            "/api/professor/appointments",
            get(handlers::appointments::list_professor_appointments),
        )
}
