//! # Booking Coordinator
//!
//! The only path by which a slot goes from free to booked and an appointment
//! comes into existence.
//!
//! ## Check order
//!
//! Checks run in a fixed order and the first failure wins, so callers can rely
//! on which error a malformed request produces:
//!
//! 1. actor must be a student (`Forbidden`)
//! 2. slot id, then professor id, must be positive integers (`InvalidInput`)
//! 3. the slot must exist under that professor (`NotFound`)
//! 4. the reason must be at least ten characters (`InvalidInput`)
//! 5. the slot must be free (`Conflict`)
//! 6. the slot must not have started yet (`InvalidInput`)
//!
//! All of these are read-only. The write itself is a single
//! [`BookingStore::book`] call, which claims the slot and inserts the
//! appointment atomically; a concurrent booking that won the race shows up
//! there as `Conflict`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::{BookingError, BookingResult};
use crate::ledger::BookingStore;
use crate::models::{
    appointment::{Appointment, BookAppointmentRequest, NewAppointment},
    user::{Actor, Role},
};
use crate::notify::{Notification, NotificationQueue};
use crate::validation::{parse_id, validate_reason};

pub struct BookingCoordinator<S: BookingStore + ?Sized> {
    store: Arc<S>,
    notifications: NotificationQueue,
}

impl<S: BookingStore + ?Sized> Clone for BookingCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifications: self.notifications.clone(),
        }
    }
}

impl<S: BookingStore + ?Sized> BookingCoordinator<S> {
    pub fn new(store: Arc<S>, notifications: NotificationQueue) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub async fn book_slot(
        &self,
        actor: Actor,
        request: &BookAppointmentRequest,
    ) -> BookingResult<Appointment> {
        if actor.role != Role::Student {
            return Err(BookingError::forbidden(
                "you are not authorised to create an appointment",
            ));
        }

        let slot_id = parse_id("slot id", request.slot_id.as_ref())?;
        let professor_id = parse_id("professor id", request.professor_id.as_ref())?;

        let slot = self
            .store
            .find_slot(professor_id, slot_id)
            .await?
            .ok_or_else(|| BookingError::not_found("slot doesn't exist in professor slots"))?;

        let reason = validate_reason(request.reason.as_deref())?;

        if slot.is_booked {
            return Err(BookingError::conflict("slot is already booked"));
        }

        if slot.slot_time < Utc::now() {
            return Err(BookingError::invalid("slot is expired"));
        }

        let appointment = self
            .store
            .book(NewAppointment {
                student_id: actor.id,
                professor_id,
                slot_id,
                slot_time: slot.slot_time,
                reason,
            })
            .await?;

        info!(
            appointment_id = appointment.id,
            slot_id,
            student_id = actor.id,
            professor_id,
            "Appointment booked"
        );

        self.notify_booked(appointment.id).await;

        Ok(appointment)
    }

    async fn notify_booked(&self, appointment_id: i64) {
        match self.store.find_by_id(appointment_id).await {
            Ok(Some(detail)) => {
                for notification in Notification::booked(&detail) {
                    self.notifications.enqueue(notification);
                }
            }
            Ok(None) => warn!(appointment_id, "Booked appointment vanished before notification"),
            Err(e) => warn!(appointment_id, error = %e, "Skipping booking notification"),
        }
    }
}
