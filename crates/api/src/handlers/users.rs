use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use officehours_core::{
    errors::BookingError,
    ledger::IdentityDirectory,
    models::user::{LoginRequest, LoginResponse, NewUser, RegisterRequest, Role, UserProfile},
    validation::{validate_email, validate_password, validate_username},
};
use tracing::info;

use super::response::ApiResponse;
use crate::{
    middleware::{auth, error_handling::AppError},
    ApiState,
};

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, BookingError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BookingError::invalid(message))
}

pub async fn register(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), AppError> {
    let Json(payload) = payload?;

    let username = required(payload.username.as_deref(), "Username is required")?;
    let email = required(payload.email.as_deref(), "Email is required")?;
    let password = required(payload.password.as_deref(), "Password is required")?;

    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)?;

    let password_hash =
        auth::hash_password(password).map_err(|e| BookingError::Internal(e.into()))?;

    let role = if payload.is_professor {
        Role::Professor
    } else {
        Role::Student
    };

    let user = state
        .store
        .create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
        })
        .await?;

    info!(user_id = user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "User created successfully",
            UserProfile::from(&user),
        )),
    ))
}

pub async fn login(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let Json(payload) = payload?;

    let username = payload.username.as_deref().filter(|v| !v.is_empty());
    let email = payload.email.as_deref().filter(|v| !v.is_empty());
    if username.is_none() && email.is_none() {
        return Err(BookingError::invalid("email or username is required").into());
    }
    let password = required(payload.password.as_deref(), "password is required")?;

    // Username wins when both are given
    let user = match (username, email) {
        (Some(username), _) => state.store.find_user_by_username(username).await?,
        (None, Some(email)) => state.store.find_user_by_email(email).await?,
        (None, None) => None,
    }
    .ok_or_else(|| BookingError::not_found("user not found"))?;

    if !auth::verify_password(password, &user.password_hash) {
        return Err(BookingError::Unauthenticated("password incorrect".to_string()).into());
    }

    let auth_token = auth::create_token(&state.jwt_secret, &user, state.jwt_ttl_hours)
        .map_err(|e| BookingError::Internal(e.into()))?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(ApiResponse::success(
        "logged in successfully",
        LoginResponse {
            auth_token,
            user: UserProfile::from(&user),
        },
    )))
}

pub async fn profile(
    State(state): State<Arc<ApiState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| BookingError::not_found("user doesn't exist"))?;

    let user = state.store.touch_last_login(user.id).await?;

    Ok(Json(ApiResponse::success(
        "user profile fetched successfully",
        UserProfile::from(&user),
    )))
}
