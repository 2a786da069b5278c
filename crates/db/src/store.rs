//! Postgres-backed implementation of the core storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use officehours_core::{
    errors::{BookingError, BookingResult},
    ledger::{AppointmentLedger, BookingStore, CancelTransition, IdentityDirectory, SlotLedger},
    models::{
        appointment::{Appointment, AppointmentDetail, AppointmentStatus, NewAppointment},
        slot::Slot,
        user::{NewUser, User},
    },
};
use tracing::debug;

use crate::DbPool;
use crate::models::DbAppointmentDetail;
use crate::repositories::{
    appointment::{self, BookOutcome, CancelOutcome, StatusOutcome},
    slot::{self, DeleteSlotOutcome},
    user::{self, CreateUserOutcome},
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn details(rows: Vec<DbAppointmentDetail>) -> BookingResult<Vec<AppointmentDetail>> {
    rows.into_iter()
        .map(|row| AppointmentDetail::try_from(row).map_err(BookingError::from))
        .collect()
}

#[async_trait]
impl SlotLedger for PgStore {
    async fn create_slot(&self, professor_id: i64, slot_time: DateTime<Utc>) -> BookingResult<Slot> {
        slot::create_slot(&self.pool, professor_id, slot_time)
            .await?
            .map(Slot::from)
            .ok_or_else(|| BookingError::conflict("slot already exist on same time"))
    }

    async fn find_slot(&self, professor_id: i64, slot_id: i64) -> BookingResult<Option<Slot>> {
        let slot = slot::get_slot(&self.pool, professor_id, slot_id).await?;
        Ok(slot.map(Slot::from))
    }

    async fn list_slots(&self, professor_id: i64) -> BookingResult<Vec<Slot>> {
        let slots = slot::get_slots_by_professor(&self.pool, professor_id).await?;
        Ok(slots.into_iter().map(Slot::from).collect())
    }

    async fn mark_booked(&self, slot_id: i64) -> BookingResult<()> {
        match slot::set_booked(&self.pool, slot_id, true).await? {
            0 => Err(BookingError::not_found(format!("slot {} not found", slot_id))),
            _ => Ok(()),
        }
    }

    async fn mark_free(&self, slot_id: i64) -> BookingResult<()> {
        match slot::set_booked(&self.pool, slot_id, false).await? {
            0 => Err(BookingError::not_found(format!("slot {} not found", slot_id))),
            _ => Ok(()),
        }
    }

    async fn delete_slot(&self, professor_id: i64, slot_id: i64) -> BookingResult<()> {
        match slot::delete_slot(&self.pool, professor_id, slot_id).await? {
            DeleteSlotOutcome::Deleted => Ok(()),
            DeleteSlotOutcome::Missing => Err(BookingError::not_found(
                "no slot present with the slot id and professor",
            )),
            DeleteSlotOutcome::Booked => {
                Err(BookingError::conflict("slot is booked and cannot be deleted"))
            }
        }
    }
}

#[async_trait]
impl AppointmentLedger for PgStore {
    async fn create_appointment(&self, new: NewAppointment) -> BookingResult<Appointment> {
        let row = appointment::create_appointment(&self.pool, &new).await?;
        Ok(Appointment::try_from(row)?)
    }

    async fn find_by_id(&self, appointment_id: i64) -> BookingResult<Option<AppointmentDetail>> {
        let row = appointment::get_appointment_detail(&self.pool, appointment_id).await?;
        Ok(row.map(AppointmentDetail::try_from).transpose()?)
    }

    async fn list_for_student(
        &self,
        student_id: i64,
        status: AppointmentStatus,
    ) -> BookingResult<Vec<AppointmentDetail>> {
        details(appointment::get_appointments_for_student(&self.pool, student_id, status).await?)
    }

    async fn list_for_professor(
        &self,
        professor_id: i64,
        status: AppointmentStatus,
    ) -> BookingResult<Vec<AppointmentDetail>> {
        details(appointment::get_appointments_for_professor(&self.pool, professor_id, status).await?)
    }

    async fn set_status(&self, appointment_id: i64, status: AppointmentStatus) -> BookingResult<()> {
        match appointment::set_status(&self.pool, appointment_id, status).await? {
            StatusOutcome::Updated => Ok(()),
            StatusOutcome::Missing => Err(BookingError::not_found(format!(
                "appointment {} not found",
                appointment_id
            ))),
            StatusOutcome::Rejected => Err(BookingError::conflict(
                "a cancelled appointment cannot be rebooked",
            )),
        }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn book(&self, new: NewAppointment) -> BookingResult<Appointment> {
        let slot_id = new.slot_id;
        match appointment::book_slot(&self.pool, &new).await? {
            BookOutcome::Booked(row) => Ok(Appointment::try_from(row)?),
            BookOutcome::SlotTaken => {
                debug!("Slot {} was claimed by a concurrent booking", slot_id);
                Err(BookingError::conflict("slot is already booked"))
            }
        }
    }

    async fn cancel(&self, appointment_id: i64) -> BookingResult<CancelTransition> {
        match appointment::cancel_appointment(&self.pool, appointment_id).await? {
            CancelOutcome::Cancelled => Ok(CancelTransition::Cancelled),
            CancelOutcome::AlreadyCancelled => Ok(CancelTransition::AlreadyCancelled),
            CancelOutcome::Missing => Err(BookingError::not_found(format!(
                "appointment {} not found",
                appointment_id
            ))),
        }
    }
}

#[async_trait]
impl IdentityDirectory for PgStore {
    async fn find_user_by_id(&self, id: i64) -> BookingResult<Option<User>> {
        let row = user::get_user_by_id(&self.pool, id).await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_user_by_username(&self, username: &str) -> BookingResult<Option<User>> {
        let row = user::get_user_by_username(&self.pool, username).await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_user_by_email(&self, email: &str) -> BookingResult<Option<User>> {
        let row = user::get_user_by_email(&self.pool, email).await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn create_user(&self, new: NewUser) -> BookingResult<User> {
        match user::create_user(&self.pool, &new).await? {
            CreateUserOutcome::Created(row) => Ok(User::try_from(row)?),
            CreateUserOutcome::UsernameTaken => Err(BookingError::conflict("Username already exists")),
            CreateUserOutcome::EmailTaken => Err(BookingError::conflict("Email already exists")),
        }
    }

    async fn touch_last_login(&self, id: i64) -> BookingResult<User> {
        let row = user::touch_last_login(&self.pool, id)
            .await?
            .ok_or_else(|| BookingError::not_found("user doesn't exist"))?;
        Ok(User::try_from(row)?)
    }
}
