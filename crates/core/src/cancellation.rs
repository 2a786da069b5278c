//! # Cancellation Coordinator
//!
//! Cancels an appointment on behalf of either party and frees its slot so it
//! can be booked again. Cancelling an appointment that is already cancelled
//! succeeds without writing anything, which also covers concurrent duplicate
//! requests: the store's conditional update lets exactly one of them through.

use std::sync::Arc;

use tracing::info;

use crate::errors::{BookingError, BookingResult};
use crate::ledger::{BookingStore, CancelTransition};
use crate::models::{
    appointment::{AppointmentDetail, AppointmentStatus, CancelOutcome},
    user::{Actor, Role},
};
use crate::notify::{Notification, NotificationQueue};
use crate::validation::{RawId, parse_id};

pub struct CancellationCoordinator<S: BookingStore + ?Sized> {
    store: Arc<S>,
    notifications: NotificationQueue,
}

impl<S: BookingStore + ?Sized> Clone for CancellationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifications: self.notifications.clone(),
        }
    }
}

fn owned_by(detail: &AppointmentDetail, actor: Actor) -> bool {
    match actor.role {
        Role::Student => detail.student.id == actor.id,
        Role::Professor => detail.professor.id == actor.id,
    }
}

impl<S: BookingStore + ?Sized> CancellationCoordinator<S> {
    pub fn new(store: Arc<S>, notifications: NotificationQueue) -> Self {
        Self {
            store,
            notifications,
        }
    }

    pub async fn cancel(&self, actor: Actor, appointment_id: Option<&RawId>) -> BookingResult<CancelOutcome> {
        let appointment_id = parse_id("appointment id", appointment_id)?;

        let detail = self
            .store
            .find_by_id(appointment_id)
            .await?
            .filter(|detail| owned_by(detail, actor))
            .ok_or_else(|| BookingError::not_found("Appointment doesn't exist"))?;

        let already = CancelOutcome {
            appointment_id,
            status: AppointmentStatus::Cancelled,
            already_cancelled: true,
        };

        if detail.status == AppointmentStatus::Cancelled {
            return Ok(already);
        }

        match self.store.cancel(appointment_id).await? {
            CancelTransition::AlreadyCancelled => Ok(already),
            CancelTransition::Cancelled => {
                info!(
                    appointment_id,
                    actor_id = actor.id,
                    role = %actor.role,
                    "Appointment cancelled"
                );

                let notification = Notification::cancelled(&detail, actor.role == Role::Professor);
                self.notifications.enqueue(notification);

                Ok(CancelOutcome {
                    appointment_id,
                    status: AppointmentStatus::Cancelled,
                    already_cancelled: false,
                })
            }
        }
    }
}
