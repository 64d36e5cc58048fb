use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Pending,
    Scheduled,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "pending",
            ConsultationStatus::Scheduled => "scheduled",
            ConsultationStatus::Completed => "completed",
            ConsultationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ConsultationStatus::Pending),
            "scheduled" => Some(ConsultationStatus::Scheduled),
            "completed" => Some(ConsultationStatus::Completed),
            "cancelled" => Some(ConsultationStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states reject cancellation and payment confirmation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConsultationStatus::Completed | ConsultationStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
    RefundPendingManual,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::RefundPendingManual => "refund_pending_manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            "refund_pending_manual" => Some(PaymentStatus::RefundPendingManual),
            _ => None,
        }
    }
}

/// Consultation modality. The location payload is mutually exclusive:
/// online carries a meeting link, offline carries an office address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsultationType {
    Online,
    Offline,
}

impl ConsultationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::Online => "Online",
            ConsultationType::Offline => "Offline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Online" => Some(ConsultationType::Online),
            "Offline" => Some(ConsultationType::Offline),
            _ => None,
        }
    }
}

/// A client's reservation of a lawyer's slot, with payment lifecycle.
/// `price` is snapshotted at reservation time and never re-read from
/// the lawyer profile afterwards.
#[derive(Debug, Clone)]
pub struct Consultation {
    pub id: i32,
    pub client_id: i32,
    pub lawyer_user_id: i32,
    pub date: DateTime<Utc>,
    pub consultation_type: ConsultationType,
    pub status: ConsultationStatus,
    pub payment_status: PaymentStatus,
    pub price: Decimal,
    pub meeting_url: Option<String>,
    pub location_gmaps: Option<String>,
    pub slot_id: Option<i32>,
    pub location_pending: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ConsultationRow {
    pub id: i32,
    pub client_id: i32,
    pub lawyer_user_id: i32,
    pub date: DateTime<Utc>,
    #[sqlx(rename = "type")]
    pub consultation_type: String,
    pub status: String,
    pub payment_status: String,
    pub price: Decimal,
    pub meeting_url: Option<String>,
    pub location_gmaps: Option<String>,
    pub slot_id: Option<i32>,
    pub location_pending: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ConsultationRow> for Consultation {
    fn from(row: ConsultationRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            lawyer_user_id: row.lawyer_user_id,
            date: row.date,
            consultation_type: ConsultationType::parse(&row.consultation_type)
                .unwrap_or(ConsultationType::Online),
            status: ConsultationStatus::parse(&row.status).unwrap_or(ConsultationStatus::Pending),
            payment_status: PaymentStatus::parse(&row.payment_status)
                .unwrap_or(PaymentStatus::Unpaid),
            price: row.price,
            meeting_url: row.meeting_url,
            location_gmaps: row.location_gmaps,
            slot_id: row.slot_id,
            location_pending: row.location_pending,
            created_at: row.created_at,
        }
    }
}
