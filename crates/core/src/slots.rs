//! Caller-facing slot operations: publish, list and withdraw.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::errors::{BookingError, BookingResult};
use crate::ledger::{IdentityDirectory, SlotLedger};
use crate::models::{
    slot::{ProfessorSlots, Slot, SlotResponse},
    user::{Actor, Role},
};
use crate::validation::{RawId, parse_id, parse_slot_time, validate_slot_window};

pub struct SlotDesk<S: SlotLedger + IdentityDirectory + ?Sized> {
    store: Arc<S>,
}

impl<S: SlotLedger + IdentityDirectory + ?Sized> Clone for SlotDesk<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SlotLedger + IdentityDirectory + ?Sized> SlotDesk<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_slot(&self, actor: Actor, slot: Option<&str>) -> BookingResult<Slot> {
        if actor.role != Role::Professor {
            return Err(BookingError::forbidden("you are not authorised to create a slot"));
        }

        let slot_time = parse_slot_time(slot)?;
        validate_slot_window(slot_time, Utc::now())?;

        let slot = self.store.create_slot(actor.id, slot_time).await?;
        info!(slot_id = slot.id, professor_id = actor.id, slot_time = %slot.slot_time, "Slot created");
        Ok(slot)
    }

    /// Slots published by the professor with `username`, ascending by time.
    pub async fn list_slots(&self, username: Option<&str>) -> BookingResult<ProfessorSlots> {
        let username = username
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BookingError::invalid("professor name is required"))?;

        let professor = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| BookingError::not_found("professor name is not valid"))?;

        if professor.role != Role::Professor {
            return Err(BookingError::invalid("the name is not related to a professor"));
        }

        let slots: Vec<SlotResponse> = self
            .store
            .list_slots(professor.id)
            .await?
            .iter()
            .map(SlotResponse::from)
            .collect();

        Ok(ProfessorSlots {
            professor: professor.summary(),
            count: slots.len(),
            slots,
        })
    }

    pub async fn delete_slot(&self, actor: Actor, slot_id: Option<&RawId>) -> BookingResult<()> {
        if actor.role != Role::Professor {
            return Err(BookingError::forbidden("you are not authorised to delete a slot"));
        }

        let slot_id = parse_id("slot id", slot_id)?;
        self.store.delete_slot(actor.id, slot_id).await?;

        info!(slot_id, professor_id = actor.id, "Slot deleted");
        Ok(())
    }
}
