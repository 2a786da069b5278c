use chrono::{DateTime, Utc};
use eyre::{Report, eyre};
use officehours_core::models::{
    appointment::{Appointment, AppointmentDetail, AppointmentStatus, SlotSummary},
    slot::Slot,
    user::{User, UserSummary},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
    pub id: i64,
    pub professor_id: i64,
    pub slot_time: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: i64,
    pub student_id: i64,
    pub professor_id: i64,
    pub slot_id: Option<i64>,
    pub slot_time: DateTime<Utc>,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Appointment row joined with both users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointmentDetail {
    pub id: i64,
    pub student_id: i64,
    pub student_username: String,
    pub student_email: String,
    pub professor_id: i64,
    pub professor_username: String,
    pub professor_email: String,
    pub slot_id: Option<i64>,
    pub slot_time: DateTime<Utc>,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

fn parse_status(raw: &str) -> Result<AppointmentStatus, Report> {
    raw.parse().map_err(|e: String| eyre!(e))
}

impl TryFrom<DbUser> for User {
    type Error = Report;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|e: String| eyre!(e))?;
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }
}

impl From<DbSlot> for Slot {
    fn from(row: DbSlot) -> Self {
        Slot {
            id: row.id,
            professor_id: row.professor_id,
            slot_time: row.slot_time,
            is_booked: row.is_booked,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = Report;

    fn try_from(row: DbAppointment) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            student_id: row.student_id,
            professor_id: row.professor_id,
            slot_id: row.slot_id,
            slot_time: row.slot_time,
            reason: row.reason,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbAppointmentDetail> for AppointmentDetail {
    type Error = Report;

    fn try_from(row: DbAppointmentDetail) -> Result<Self, Self::Error> {
        Ok(AppointmentDetail {
            id: row.id,
            student: UserSummary {
                id: row.student_id,
                username: row.student_username,
                email: row.student_email,
            },
            professor: UserSummary {
                id: row.professor_id,
                username: row.professor_username,
                email: row.professor_email,
            },
            slot: SlotSummary {
                id: row.slot_id,
                slot: row.slot_time,
            },
            reason: row.reason,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}
