use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Consultation, Review, SlotStatus, TimeSlot};

/// Fixed-field projections handed to the rendering layer. The engine
/// never produces markup, only these records.

#[derive(Debug, Clone, Serialize)]
pub struct TimeSlotView {
    pub id: i32,
    pub lawyer_id: i32,
    pub time: String,
    pub status: &'static str,
}

impl TimeSlotView {
    /// `expired` exists only here: an available slot whose hour already
    /// passed is shown as expired but stays `available` in storage.
    pub fn project(slot: &TimeSlot, now: DateTime<Utc>) -> Self {
        let status = if slot.status == SlotStatus::Available && slot.slot_datetime <= now {
            "expired"
        } else {
            slot.status.as_str()
        };

        Self {
            id: slot.id,
            lawyer_id: slot.lawyer_id,
            time: slot.slot_datetime.to_rfc3339(),
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultationView {
    pub id: i32,
    pub client_id: i32,
    pub lawyer_user_id: i32,
    pub date: String,
    pub r#type: &'static str,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub price: String,
    pub meeting_url: Option<String>,
    pub location_gmaps: Option<String>,
    pub location_pending: bool,
}

impl ConsultationView {
    pub fn project(consultation: &Consultation) -> Self {
        Self {
            id: consultation.id,
            client_id: consultation.client_id,
            lawyer_user_id: consultation.lawyer_user_id,
            date: consultation.date.to_rfc3339(),
            r#type: consultation.consultation_type.as_str(),
            status: consultation.status.as_str(),
            payment_status: consultation.payment_status.as_str(),
            price: format!("{:.2}", consultation.price),
            meeting_url: consultation.meeting_url.clone(),
            location_gmaps: consultation.location_gmaps.clone(),
            location_pending: consultation.location_pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub id: i32,
    pub consultation_id: i32,
    pub client_id: i32,
    pub lawyer_user_id: i32,
    pub rating: i16,
    pub text: String,
    pub date: String,
}

impl ReviewView {
    pub fn project(review: &Review) -> Self {
        Self {
            id: review.id,
            consultation_id: review.consultation_id,
            client_id: review.client_id,
            lawyer_user_id: review.lawyer_user_id,
            rating: review.rating,
            text: review.text.clone(),
            date: review.created_at.to_rfc3339(),
        }
    }
}
