use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};
use crate::ledger::AppointmentLedger;
use crate::models::{
    appointment::AppointmentListResponse,
    user::{Actor, Role},
};
use crate::validation::parse_status;

/// Which side of the appointment relation a listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentView {
    Student,
    Professor,
}

impl AppointmentView {
    fn role(&self) -> Role {
        match self {
            AppointmentView::Student => Role::Student,
            AppointmentView::Professor => Role::Professor,
        }
    }
}

/// Read-only, role-scoped appointment listings.
pub struct QueryService<S: AppointmentLedger + ?Sized> {
    store: Arc<S>,
}

impl<S: AppointmentLedger + ?Sized> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AppointmentLedger + ?Sized> QueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Lists the actor's appointments in `status` (default `booked`).
    ///
    /// The status is validated before the role so a bad filter is reported
    /// even to the wrong audience.
    pub async fn list_appointments(
        &self,
        actor: Actor,
        view: AppointmentView,
        status: Option<&str>,
    ) -> BookingResult<AppointmentListResponse> {
        let status = parse_status(status)?;

        if actor.role != view.role() {
            return Err(BookingError::forbidden(format!(
                "this api is only for {}s to get the appointments",
                view.role()
            )));
        }

        let appointments = match view {
            AppointmentView::Student => self.store.list_for_student(actor.id, status).await?,
            AppointmentView::Professor => self.store.list_for_professor(actor.id, status).await?,
        };

        Ok(AppointmentListResponse {
            count: appointments.len(),
            appointments,
        })
    }
}
