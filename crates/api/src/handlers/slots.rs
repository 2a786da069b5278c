use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use officehours_core::{
    models::slot::{CreateSlotRequest, ProfessorSlots, SlotResponse},
    validation::RawId,
};

use super::response::ApiResponse;
use crate::{
    middleware::{auth::AuthUser, error_handling::AppError},
    ApiState,
};

pub async fn create_slot(
    State(state): State<Arc<ApiState>>,
    AuthUser(actor): AuthUser,
    payload: Result<Json<CreateSlotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SlotResponse>>), AppError> {
    let Json(payload) = payload?;

    let slot = state.slots.create_slot(actor, payload.slot.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "slot is created successfully",
            SlotResponse::from(&slot),
        )),
    ))
}

pub async fn delete_slot(
    State(state): State<Arc<ApiState>>,
    AuthUser(actor): AuthUser,
    Path(slot_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .slots
        .delete_slot(actor, Some(&RawId::Text(slot_id)))
        .await?;

    Ok(Json(ApiResponse::success("slot is deleted successfully", ())))
}

pub async fn list_professor_slots(
    State(state): State<Arc<ApiState>>,
    AuthUser(_actor): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfessorSlots>>, AppError> {
    let slots = state.slots.list_slots(Some(&username)).await?;

    Ok(Json(ApiResponse::list(
        "professor slots fetched successfully",
        slots.count,
        slots,
    )))
}
