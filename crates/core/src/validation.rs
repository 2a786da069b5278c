//! Field-level validation shared by the coordinators and the identity layer.
//!
//! Each failure maps 1:1 to a user-facing message carried by
//! [`BookingError::InvalidInput`].

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};
use crate::models::appointment::AppointmentStatus;

/// Minimum length of the reason a student gives when booking.
pub const MIN_REASON_LEN: usize = 10;
/// How far ahead of now a slot may be published.
pub const MAX_SLOT_HORIZON_MONTHS: u32 = 12;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// An identifier as it arrives from a caller, before validation.
///
/// Clients send ids both as JSON numbers and as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for RawId {
    fn from(value: i64) -> Self {
        RawId::Int(value)
    }
}

impl From<&str> for RawId {
    fn from(value: &str) -> Self {
        RawId::Text(value.to_string())
    }
}

/// Validates that `raw` is present and a positive integer.
///
/// `field` is the human name used in messages, e.g. "slot id".
pub fn parse_id(field: &str, raw: Option<&RawId>) -> BookingResult<i64> {
    let raw = raw.ok_or_else(|| BookingError::invalid(format!("{} is required", field)))?;

    let value = match raw {
        RawId::Int(v) => *v,
        RawId::Float(v) if v.fract() == 0.0 && v.is_finite() => *v as i64,
        RawId::Float(_) => {
            return Err(BookingError::invalid(format!("{} should be a number", field)));
        }
        RawId::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(BookingError::invalid(format!("{} is required", field)));
            }
            trimmed
                .parse::<i64>()
                .map_err(|_| BookingError::invalid(format!("{} should be a number", field)))?
        }
    };

    if value <= 0 {
        return Err(BookingError::invalid(format!(
            "{} should be a positive number",
            field
        )));
    }

    Ok(value)
}

pub fn validate_reason(reason: Option<&str>) -> BookingResult<String> {
    match reason {
        Some(r) if r.chars().count() >= MIN_REASON_LEN => Ok(r.to_string()),
        _ => Err(BookingError::invalid(format!(
            "reason is required and must be at least {} characters",
            MIN_REASON_LEN
        ))),
    }
}

/// Parses the `status` filter of a listing. Absent means `booked`.
pub fn parse_status(status: Option<&str>) -> BookingResult<AppointmentStatus> {
    match status {
        None => Ok(AppointmentStatus::Booked),
        Some(s) => s
            .parse()
            .map_err(|_| BookingError::invalid("status is not valid")),
    }
}

pub fn parse_slot_time(raw: Option<&str>) -> BookingResult<DateTime<Utc>> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BookingError::invalid("slot is required"))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            BookingError::invalid(
                "slot is not a valid date time, send it in the 2015-03-25T12:00:00Z format",
            )
        })
}

/// A slot must lie between `now` and twelve calendar months from `now`.
pub fn validate_slot_window(slot_time: DateTime<Utc>, now: DateTime<Utc>) -> BookingResult<()> {
    if slot_time < now {
        return Err(BookingError::invalid("slot shouldn't be in past"));
    }

    let horizon = now
        .checked_add_months(Months::new(MAX_SLOT_HORIZON_MONTHS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if slot_time > horizon {
        return Err(BookingError::invalid(
            "slot shouldn't be more than 1 year in gap",
        ));
    }

    Ok(())
}

pub fn validate_username(username: &str) -> BookingResult<()> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(BookingError::invalid(format!(
            "Username must be at least {} characters long",
            USERNAME_MIN_LEN
        )));
    }
    if len > USERNAME_MAX_LEN {
        return Err(BookingError::invalid(format!(
            "Username must be at most {} characters long",
            USERNAME_MAX_LEN
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(BookingError::invalid(
            "Username should only contain letters and numbers",
        ));
    }
    Ok(())
}

/// Accepts `local@domain.tld` with no whitespace.
pub fn validate_email(email: &str) -> BookingResult<()> {
    let invalid = || BookingError::invalid("Invalid email format");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> BookingResult<()> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(BookingError::invalid(format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN_LEN
        )));
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    let only_allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));

    if !(has_lower && has_upper && has_digit && has_special && only_allowed) {
        return Err(BookingError::invalid(format!(
            "Password must contain at least one uppercase letter, one lowercase letter, one number, and one of {}",
            PASSWORD_SPECIALS
        )));
    }
    Ok(())
}
