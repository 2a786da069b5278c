use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: i64,
    pub professor_id: i64,
    pub slot_time: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    /// RFC 3339 timestamp, e.g. `2030-03-25T12:00:00Z`.
    pub slot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResponse {
    pub id: i64,
    pub slot: DateTime<Utc>,
    pub is_booked: bool,
}

impl From<&Slot> for SlotResponse {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            slot: slot.slot_time,
            is_booked: slot.is_booked,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessorSlots {
    pub professor: UserSummary,
    /// Reported once, at the top level of the list envelope.
    #[serde(skip)]
    pub count: usize,
    pub slots: Vec<SlotResponse>,
}
