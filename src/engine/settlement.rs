use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::database::Database;
use crate::error::{EngineError, EngineResult};
use crate::gateway::CheckoutRequest;
use crate::models::consultation::ConsultationRow;
use crate::models::{Consultation, ConsultationStatus, ConsultationType, PaymentStatus};
use crate::notify::{notify_best_effort, NotificationChannel};

/// What the lawyer keeps of a consultation price after the platform
/// commission, to cent precision.
pub fn lawyer_earnings(price: Decimal, commission_rate: Decimal) -> Decimal {
    (price * (Decimal::ONE - commission_rate)).round_dp(2)
}

#[derive(Debug, FromRow)]
struct LawyerPayoutRow {
    id: i32,
    fullname: String,
    zoom_link: Option<String>,
    office_address: Option<String>,
}

/// Flips confirmed checkouts to paid/scheduled and credits the lawyer
/// ledger. Both gateway delivery paths (signed webhook and the success
/// redirect) funnel into `confirm_payment`; the unpaid precondition is
/// the sole idempotency guard, exactly one credit per consultation.
#[derive(Clone)]
pub struct SettlementEngine {
    db: Database,
    config: EngineConfig,
    notifier: Arc<dyn NotificationChannel>,
}

impl SettlementEngine {
    pub fn new(db: Database, config: EngineConfig, notifier: Arc<dyn NotificationChannel>) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }

    /// Builds the gateway checkout payload for a freshly reserved,
    /// still-unpaid consultation.
    pub async fn checkout_request(&self, consultation_id: i32) -> EngineResult<CheckoutRequest> {
        let row: Option<ConsultationRow> = sqlx::query_as(
            r#"
            SELECT id, client_id, lawyer_user_id, date, type, status, payment_status,
                   price, meeting_url, location_gmaps, slot_id, location_pending, created_at
            FROM consultations
            WHERE id = $1
            "#,
        )
        .bind(consultation_id)
        .fetch_optional(&self.db.pool)
        .await?;
        let consultation: Consultation = row
            .map(Consultation::from)
            .ok_or(EngineError::NotFound("consultation"))?;

        if consultation.payment_status != PaymentStatus::Unpaid {
            return Err(EngineError::InvalidTransition(consultation_id));
        }

        let lawyer_name: Option<(String,)> =
            sqlx::query_as("SELECT fullname FROM users WHERE id = $1")
                .bind(consultation.lawyer_user_id)
                .fetch_optional(&self.db.pool)
                .await?;
        let lawyer_name = lawyer_name
            .map(|(name,)| name)
            .unwrap_or_else(|| "your lawyer".to_string());

        CheckoutRequest::new(&consultation, &lawyer_name, &self.config.currency)
    }

    /// Marks the consultation paid and scheduled and credits the lawyer
    /// `price × (1 − commission)`. Idempotent: an already-paid booking is
    /// a no-op, so it does not matter whether the webhook or the redirect
    /// lands first (or both do).
    pub async fn confirm_payment(&self, consultation_id: i32) -> EngineResult<()> {
        let mut tx = self.db.pool.begin().await?;

        let row: Option<ConsultationRow> = sqlx::query_as(
            r#"
            SELECT id, client_id, lawyer_user_id, date, type, status, payment_status,
                   price, meeting_url, location_gmaps, slot_id, location_pending, created_at
            FROM consultations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(consultation_id)
        .fetch_optional(&mut *tx)
        .await?;
        let consultation: Consultation = row
            .map(Consultation::from)
            .ok_or(EngineError::NotFound("consultation"))?;

        match consultation.payment_status {
            PaymentStatus::Unpaid => {}
            PaymentStatus::Paid => {
                log::info!(
                    "Consultation {} already paid, duplicate confirmation ignored",
                    consultation_id
                );
                return Ok(());
            }
            PaymentStatus::Refunded | PaymentStatus::RefundPendingManual => {
                return Err(EngineError::InvalidTransition(consultation_id));
            }
        }

        // A cancel that won the race leaves the booking unpaid but
        // cancelled; confirming it now would pay for a dead booking.
        if consultation.status == ConsultationStatus::Cancelled {
            return Err(EngineError::InvalidTransition(consultation_id));
        }

        let lawyer: Option<LawyerPayoutRow> = sqlx::query_as(
            r#"
            SELECT id, fullname, zoom_link, office_address
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(consultation.lawyer_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut meeting_url = consultation.meeting_url.clone();
        let mut location_gmaps = consultation.location_gmaps.clone();
        let location_pending;
        let mut credited = None;

        match lawyer {
            Some(lawyer) => {
                let earnings = lawyer_earnings(consultation.price, self.config.commission_rate);
                sqlx::query(
                    "UPDATE users SET balance = balance + $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(earnings)
                .bind(lawyer.id)
                .execute(&mut *tx)
                .await?;

                match consultation.consultation_type {
                    ConsultationType::Online => {
                        if meeting_url.is_none() {
                            meeting_url = lawyer.zoom_link.clone();
                        }
                        location_pending = meeting_url.is_none();
                    }
                    ConsultationType::Offline => {
                        if location_gmaps.is_none() {
                            location_gmaps = lawyer.office_address.clone();
                        }
                        location_pending = location_gmaps.is_none();
                    }
                }

                log::info!(
                    "💰 Consultation {} paid, lawyer {} credited {}",
                    consultation_id,
                    lawyer.fullname,
                    earnings
                );
                credited = Some((lawyer.fullname, earnings));
            }
            None => {
                // Payment capture must not fail on a secondary lookup:
                // take the money, flag the location for manual follow-up.
                log::error!(
                    "Lawyer {} missing while settling consultation {}, flagged for manual review",
                    consultation.lawyer_user_id,
                    consultation_id
                );
                location_pending = true;
            }
        }

        sqlx::query(
            r#"
            UPDATE consultations
            SET payment_status = 'paid',
                status = 'scheduled',
                meeting_url = $1,
                location_gmaps = $2,
                location_pending = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&meeting_url)
        .bind(&location_gmaps)
        .bind(location_pending)
        .bind(consultation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let message = match credited {
            Some((name, earnings)) => format!(
                "Consultation {} confirmed and scheduled; {} credited {}",
                consultation_id, name, earnings
            ),
            None => format!(
                "Consultation {} paid but lawyer record missing, needs manual follow-up",
                consultation_id
            ),
        };
        notify_best_effort(self.notifier.as_ref(), &message);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ninety_percent_of_a_hundred() {
        assert_eq!(lawyer_earnings(dec!(100.00), dec!(0.10)), dec!(90.00));
    }

    #[test]
    fn earnings_round_to_cents_without_drift() {
        assert_eq!(lawyer_earnings(dec!(33.33), dec!(0.10)), dec!(30.00));
        assert_eq!(lawyer_earnings(dec!(0.01), dec!(0.10)), dec!(0.01));
        assert_eq!(lawyer_earnings(dec!(99.99), dec!(0.10)), dec!(89.99));
    }

    #[test]
    fn zero_commission_passes_price_through() {
        assert_eq!(lawyer_earnings(dec!(120.50), Decimal::ZERO), dec!(120.50));
    }
}
