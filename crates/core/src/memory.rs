//! In-memory [`Store`](crate::ledger::Store) used by tests and local runs.
//!
//! All state sits behind one async mutex, so every trait method is atomic with
//! respect to every other one. Joined listings skip rows whose users are
//! missing, matching an inner join.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::eyre;
use tokio::sync::Mutex;

use crate::errors::{BookingError, BookingResult};
use crate::ledger::{
    AppointmentLedger, BookingStore, CancelTransition, IdentityDirectory, SlotLedger,
};
use crate::models::{
    appointment::{Appointment, AppointmentDetail, AppointmentStatus, NewAppointment, SlotSummary},
    slot::Slot,
    user::{NewUser, User},
};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    slots: BTreeMap<i64, Slot>,
    appointments: BTreeMap<i64, Appointment>,
    next_user_id: i64,
    next_slot_id: i64,
    next_appointment_id: i64,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn detail(&self, appointment: &Appointment) -> Option<AppointmentDetail> {
        let student = self.users.get(&appointment.student_id)?;
        let professor = self.users.get(&appointment.professor_id)?;
        Some(AppointmentDetail {
            id: appointment.id,
            student: student.summary(),
            professor: professor.summary(),
            slot: SlotSummary {
                id: appointment.slot_id,
                slot: appointment.slot_time,
            },
            reason: appointment.reason.clone(),
            status: appointment.status,
            created_at: appointment.created_at,
        })
    }

    fn listing<F>(&self, filter: F) -> Vec<AppointmentDetail>
    where
        F: Fn(&Appointment) -> bool,
    {
        self.appointments
            .values()
            .filter(|a| filter(a))
            .filter_map(|a| self.detail(a))
            .collect()
    }

    fn insert_appointment(&mut self, new: NewAppointment) -> Appointment {
        let id = Self::next_id(&mut self.next_appointment_id);
        let appointment = Appointment {
            id,
            student_id: new.student_id,
            professor_id: new.professor_id,
            slot_id: Some(new.slot_id),
            slot_time: new.slot_time,
            reason: new.reason,
            status: AppointmentStatus::Booked,
            created_at: Utc::now(),
        };
        self.appointments.insert(id, appointment.clone());
        appointment
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    offline: AtomicBool,
    reject_appointment_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes the appointment insert inside [`BookingStore::book`] fail after
    /// the slot has been claimed, to exercise the rollback path.
    pub fn reject_appointment_writes(&self, reject: bool) {
        self.reject_appointment_writes.store(reject, Ordering::SeqCst);
    }

    fn check_online(&self) -> BookingResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BookingError::Unavailable(eyre!("in-memory store is offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl SlotLedger for InMemoryStore {
    async fn create_slot(&self, professor_id: i64, slot_time: DateTime<Utc>) -> BookingResult<Slot> {
        self.check_online()?;
        let mut state = self.state.lock().await;

        let taken = state
            .slots
            .values()
            .any(|s| s.professor_id == professor_id && s.slot_time == slot_time);
        if taken {
            return Err(BookingError::conflict("slot already exist on same time"));
        }

        let id = State::next_id(&mut state.next_slot_id);
        let slot = Slot {
            id,
            professor_id,
            slot_time,
            is_booked: false,
            created_at: Utc::now(),
        };
        state.slots.insert(id, slot.clone());
        Ok(slot)
    }

    async fn find_slot(&self, professor_id: i64, slot_id: i64) -> BookingResult<Option<Slot>> {
        self.check_online()?;
        let state = self.state.lock().await;
        Ok(state
            .slots
            .get(&slot_id)
            .filter(|s| s.professor_id == professor_id)
            .cloned())
    }

    async fn list_slots(&self, professor_id: i64) -> BookingResult<Vec<Slot>> {
        self.check_online()?;
        let state = self.state.lock().await;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.professor_id == professor_id)
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.slot_time.cmp(&b.slot_time).then(a.id.cmp(&b.id)));
        Ok(slots)
    }

    async fn mark_booked(&self, slot_id: i64) -> BookingResult<()> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let slot = state
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| BookingError::not_found(format!("slot {} not found", slot_id)))?;
        slot.is_booked = true;
        Ok(())
    }

    async fn mark_free(&self, slot_id: i64) -> BookingResult<()> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let slot = state
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| BookingError::not_found(format!("slot {} not found", slot_id)))?;
        slot.is_booked = false;
        Ok(())
    }

    async fn delete_slot(&self, professor_id: i64, slot_id: i64) -> BookingResult<()> {
        self.check_online()?;
        let mut state = self.state.lock().await;

        let slot = state
            .slots
            .get(&slot_id)
            .filter(|s| s.professor_id == professor_id)
            .ok_or_else(|| {
                BookingError::not_found("no slot present with the slot id and professor")
            })?;
        if slot.is_booked {
            return Err(BookingError::conflict("slot is booked and cannot be deleted"));
        }

        state.slots.remove(&slot_id);
        for appointment in state.appointments.values_mut() {
            if appointment.slot_id == Some(slot_id) {
                appointment.slot_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentLedger for InMemoryStore {
    async fn create_appointment(&self, new: NewAppointment) -> BookingResult<Appointment> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        Ok(state.insert_appointment(new))
    }

    async fn find_by_id(&self, appointment_id: i64) -> BookingResult<Option<AppointmentDetail>> {
        self.check_online()?;
        let state = self.state.lock().await;
        Ok(state
            .appointments
            .get(&appointment_id)
            .and_then(|a| state.detail(a)))
    }

    async fn list_for_student(
        &self,
        student_id: i64,
        status: AppointmentStatus,
    ) -> BookingResult<Vec<AppointmentDetail>> {
        self.check_online()?;
        let state = self.state.lock().await;
        Ok(state.listing(|a| a.student_id == student_id && a.status == status))
    }

    async fn list_for_professor(
        &self,
        professor_id: i64,
        status: AppointmentStatus,
    ) -> BookingResult<Vec<AppointmentDetail>> {
        self.check_online()?;
        let state = self.state.lock().await;
        Ok(state.listing(|a| a.professor_id == professor_id && a.status == status))
    }

    async fn set_status(&self, appointment_id: i64, status: AppointmentStatus) -> BookingResult<()> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let appointment = state.appointments.get_mut(&appointment_id).ok_or_else(|| {
            BookingError::not_found(format!("appointment {} not found", appointment_id))
        })?;

        match (appointment.status, status) {
            (current, wanted) if current == wanted => Ok(()),
            (AppointmentStatus::Booked, AppointmentStatus::Cancelled) => {
                appointment.status = AppointmentStatus::Cancelled;
                Ok(())
            }
            _ => Err(BookingError::conflict("a cancelled appointment cannot be rebooked")),
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn book(&self, new: NewAppointment) -> BookingResult<Appointment> {
        self.check_online()?;
        let mut state = self.state.lock().await;

        let slot_id = new.slot_id;
        match state.slots.get_mut(&slot_id) {
            Some(slot) if slot.professor_id == new.professor_id && !slot.is_booked => {
                slot.is_booked = true;
            }
            Some(slot) if slot.professor_id == new.professor_id => {
                return Err(BookingError::conflict("slot is already booked"));
            }
            _ => return Err(BookingError::not_found("slot doesn't exist in professor slots")),
        }

        if self.reject_appointment_writes.load(Ordering::SeqCst) {
            // Undo the claim so the slot is not left booked without an appointment.
            if let Some(slot) = state.slots.get_mut(&slot_id) {
                slot.is_booked = false;
            }
            return Err(BookingError::Unavailable(eyre!(
                "appointment insert rejected for slot {}",
                slot_id
            )));
        }

        Ok(state.insert_appointment(new))
    }

    async fn cancel(&self, appointment_id: i64) -> BookingResult<CancelTransition> {
        self.check_online()?;
        let mut state = self.state.lock().await;

        let appointment = state.appointments.get_mut(&appointment_id).ok_or_else(|| {
            BookingError::not_found(format!("appointment {} not found", appointment_id))
        })?;
        if appointment.status == AppointmentStatus::Cancelled {
            return Ok(CancelTransition::AlreadyCancelled);
        }
        appointment.status = AppointmentStatus::Cancelled;
        let slot_id = appointment.slot_id;

        if let Some(slot) = slot_id.and_then(|id| state.slots.get_mut(&id)) {
            slot.is_booked = false;
        }
        Ok(CancelTransition::Cancelled)
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryStore {
    async fn find_user_by_id(&self, id: i64) -> BookingResult<Option<User>> {
        self.check_online()?;
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> BookingResult<Option<User>> {
        self.check_online()?;
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> BookingResult<Option<User>> {
        self.check_online()?;
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewUser) -> BookingResult<User> {
        self.check_online()?;
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.username == new.username) {
            return Err(BookingError::conflict("Username already exists"));
        }
        if state.users.values().any(|u| u.email == new.email) {
            return Err(BookingError::conflict("Email already exists"));
        }

        let id = State::next_id(&mut state.next_user_id);
        let user = User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            last_login: None,
            created_at: Utc::now(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn touch_last_login(&self, id: i64) -> BookingResult<User> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| BookingError::not_found("user doesn't exist"))?;
        user.last_login = Some(Utc::now());
        Ok(user.clone())
    }
}
