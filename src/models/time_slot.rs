use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted slot state. `expired` never hits the table; it is derived
/// at projection time for available slots already in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Break,
    Booked,
    Unavailable,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Break => "break",
            SlotStatus::Booked => "booked",
            SlotStatus::Unavailable => "unavailable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(SlotStatus::Available),
            "break" => Some(SlotStatus::Break),
            "booked" => Some(SlotStatus::Booked),
            "unavailable" => Some(SlotStatus::Unavailable),
            _ => None,
        }
    }
}

/// One bookable hour for one lawyer. At most one non-cancelled
/// consultation may reference a slot at a time.
#[derive(Debug, Clone)]
pub struct TimeSlot {
    pub id: i32,
    pub lawyer_id: i32,
    pub slot_datetime: DateTime<Utc>,
    pub status: SlotStatus,
    pub consultation_id: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TimeSlotRow {
    pub id: i32,
    pub lawyer_id: i32,
    pub slot_datetime: DateTime<Utc>,
    pub status: String,
    pub consultation_id: Option<i32>,
}

impl From<TimeSlotRow> for TimeSlot {
    fn from(row: TimeSlotRow) -> Self {
        Self {
            id: row.id,
            lawyer_id: row.lawyer_id,
            slot_datetime: row.slot_datetime,
            status: SlotStatus::parse(&row.status).unwrap_or(SlotStatus::Unavailable),
            consultation_id: row.consultation_id,
        }
    }
}
