use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use officehours_core::{
    models::{
        appointment::{Appointment, AppointmentDetail, BookAppointmentRequest, CancelOutcome},
        user::Actor,
    },
    query::AppointmentView,
    validation::RawId,
};
use serde::Deserialize;

use super::response::ApiResponse;
use crate::{
    middleware::{auth::AuthUser, error_handling::AppError},
    ApiState,
};

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

pub async fn book_appointment(
    State(state): State<Arc<ApiState>>,
    AuthUser(actor): AuthUser,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Appointment>>), AppError> {
    let Json(payload) = payload?;

    let appointment = state.booking.book_slot(actor, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Appointment is successfully created",
            appointment,
        )),
    ))
}

pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    AuthUser(actor): AuthUser,
    Path(appointment_id): Path<String>,
) -> Result<Json<ApiResponse<CancelOutcome>>, AppError> {
    let outcome = state
        .cancellation
        .cancel(actor, Some(&RawId::Text(appointment_id)))
        .await?;

    Ok(Json(ApiResponse::success(
        "Appointment cancelled successfully",
        outcome,
    )))
}

async fn list_appointments(
    state: &ApiState,
    actor: Actor,
    view: AppointmentView,
    query: StatusQuery,
) -> Result<Json<ApiResponse<Vec<AppointmentDetail>>>, AppError> {
    let listing = state
        .queries
        .list_appointments(actor, view, query.status.as_deref())
        .await?;

    Ok(Json(ApiResponse::list(
        "appointments fetched successfully",
        listing.count,
        listing.appointments,
    )))
}

pub async fn list_student_appointments(
    State(state): State<Arc<ApiState>>,
    AuthUser(actor): AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Vec<AppointmentDetail>>>, AppError> {
    list_appointments(&state, actor, AppointmentView::Student, query).await
}

pub async fn list_professor_appointments(
    State(state): State<Arc<ApiState>>,
    AuthUser(actor): AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Vec<AppointmentDetail>>>, AppError> {
    list_appointments(&state, actor, AppointmentView::Professor, query).await
}
