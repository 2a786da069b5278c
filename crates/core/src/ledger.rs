//! Storage-access abstraction the coordinators are built on.
//!
//! A single store is constructed at process start and shared as
//! `Arc<dyn Store>`. The Postgres implementation lives in `officehours-db`;
//! [`crate::memory::InMemoryStore`] backs the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::BookingResult;
use crate::models::{
    appointment::{Appointment, AppointmentDetail, AppointmentStatus, NewAppointment},
    slot::Slot,
    user::{NewUser, User},
};

#[async_trait]
pub trait SlotLedger: Send + Sync {
    /// Inserts an unbooked slot.
    ///
    /// Fails with `Conflict` when the professor already owns a slot at
    /// exactly `slot_time`. The time window is checked by the caller.
    async fn create_slot(&self, professor_id: i64, slot_time: DateTime<Utc>) -> BookingResult<Slot>;

    /// Looks a slot up scoped to its owning professor.
    async fn find_slot(&self, professor_id: i64, slot_id: i64) -> BookingResult<Option<Slot>>;

    /// Slots of a professor, ascending by timestamp.
    async fn list_slots(&self, professor_id: i64) -> BookingResult<Vec<Slot>>;

    async fn mark_booked(&self, slot_id: i64) -> BookingResult<()>;

    async fn mark_free(&self, slot_id: i64) -> BookingResult<()>;

    /// `NotFound` if the professor owns no such slot, `Conflict` if it is booked.
    async fn delete_slot(&self, professor_id: i64, slot_id: i64) -> BookingResult<()>;
}

#[async_trait]
pub trait AppointmentLedger: Send + Sync {
    /// Inserts a booked appointment without re-checking the slot.
    async fn create_appointment(&self, new: NewAppointment) -> BookingResult<Appointment>;

    async fn find_by_id(&self, appointment_id: i64) -> BookingResult<Option<AppointmentDetail>>;

    async fn list_for_student(
        &self,
        student_id: i64,
        status: AppointmentStatus,
    ) -> BookingResult<Vec<AppointmentDetail>>;

    async fn list_for_professor(
        &self,
        professor_id: i64,
        status: AppointmentStatus,
    ) -> BookingResult<Vec<AppointmentDetail>>;

    /// One-way transition; setting the status already held is a no-op.
    async fn set_status(&self, appointment_id: i64, status: AppointmentStatus) -> BookingResult<()>;
}

/// Result of the atomic cancellation write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelTransition {
    /// This call moved the appointment from booked to cancelled.
    Cancelled,
    /// Another call got there first; nothing was written.
    AlreadyCancelled,
}

/// The atomic multi-row operations the coordinators rely on.
#[async_trait]
pub trait BookingStore: SlotLedger + AppointmentLedger {
    /// Claims the slot and creates the appointment as one unit.
    ///
    /// Fails with `Conflict` when the slot is no longer free (someone else
    /// claimed it first) and with `Unavailable` on storage failure; in both
    /// cases nothing is written.
    async fn book(&self, new: NewAppointment) -> BookingResult<Appointment>;

    /// Moves a booked appointment to cancelled and frees its slot as one unit.
    async fn cancel(&self, appointment_id: i64) -> BookingResult<CancelTransition>;
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_user_by_id(&self, id: i64) -> BookingResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> BookingResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> BookingResult<Option<User>>;

    /// `Conflict` when the username or email is taken.
    async fn create_user(&self, new: NewUser) -> BookingResult<User>;

    async fn touch_last_login(&self, id: i64) -> BookingResult<User>;
}

/// Everything the service needs from its datastore.
pub trait Store: BookingStore + IdentityDirectory {}

impl<T: BookingStore + IdentityDirectory + ?Sized> Store for T {}
