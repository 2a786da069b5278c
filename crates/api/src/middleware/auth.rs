//! # Authentication Module
//!
//! Password hashing with Argon2, HS256 auth tokens, and the [`AuthUser`]
//! extractor that turns an `Authorization: Bearer <token>` header into the
//! [`Actor`] performing the request.
//!
//! The token only identifies the user. The role is always re-read from the
//! identity directory so a stale token cannot carry a stale role.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use eyre::{eyre, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use officehours_core::{
    errors::{BookingError, BookingResult},
    ledger::IdentityDirectory,
    models::user::{Actor, Role, User},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{middleware::error_handling::AppError, ApiState};

/// Hashes a password using the Argon2 algorithm
///
/// A fresh random salt is generated per call and the result is returned in
/// PHC string format.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| eyre!("Error hashing password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Returns `false` for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            debug!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// user id
    pub sub: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_token(secret: &str, user: &User, ttl_hours: i64) -> Result<String> {
    let now = Utc::now();
    let expires = Duration::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| eyre!("token lifetime of {} hours overflows", ttl_hours))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> BookingResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected auth token: {}", e);
        BookingError::Unauthenticated("Invalid Token".to_string())
    })?;

    Ok(data.claims)
}

pub fn bearer_token(headers: &HeaderMap) -> BookingResult<&str> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BookingError::Unauthenticated("Auth token required".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| BookingError::Unauthenticated("Invalid Authorization format".to_string()))
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Actor);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = decode_token(&state.jwt_secret, token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| BookingError::Unauthenticated("Invalid Token".to_string()))?;

        let user = state
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| BookingError::Unauthenticated("user not found".to_string()))?;

        Ok(AuthUser(user.actor()))
    }
}
