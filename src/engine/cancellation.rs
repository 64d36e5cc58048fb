use rust_decimal::Decimal;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::database::Database;
use crate::engine::settlement::lawyer_earnings;
use crate::error::{EngineError, EngineResult};
use crate::models::consultation::ConsultationRow;
use crate::models::{Actor, Consultation, PaymentStatus};
use crate::notify::{notify_best_effort, NotificationChannel};

/// Balance movement performed by a cancellation, for the route layer's
/// user-facing messages and for the books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationOutcome {
    pub payment_status: PaymentStatus,
    /// Full price snapshot returned to the client, if the booking was paid.
    pub refund: Option<Decimal>,
    /// Amount actually debited from the lawyer (post-clamp).
    pub reversal: Option<Decimal>,
    /// True when the lawyer balance could not cover the full reversal.
    pub reversal_clamped: bool,
}

/// Undoes a booking: frees the slot, refunds the client's balance and
/// reverses the lawyer's commission-adjusted credit, all in one
/// transaction.
#[derive(Clone)]
pub struct CancellationEngine {
    db: Database,
    config: EngineConfig,
    notifier: Arc<dyn NotificationChannel>,
}

impl CancellationEngine {
    pub fn new(db: Database, config: EngineConfig, notifier: Arc<dyn NotificationChannel>) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }

    pub async fn cancel(
        &self,
        consultation_id: i32,
        actor: &Actor,
    ) -> EngineResult<CancellationOutcome> {
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

        let is_party = actor.user_id == consultation.client_id
            || actor.user_id == consultation.lawyer_user_id;
        if !is_party && !actor.is_admin() {
            return Err(EngineError::AuthorizationDenied);
        }

        if consultation.status.is_terminal() {
            return Err(EngineError::InvalidTransition(consultation_id));
        }

        // Put the hour back on sale and drop both back-references.
        if let Some(slot_id) = consultation.slot_id {
            sqlx::query(
                r#"
                UPDATE time_slots
                SET status = 'available', consultation_id = NULL
                WHERE id = $1 AND status = 'booked'
                "#,
            )
            .bind(slot_id)
            .execute(&mut *tx)
            .await?;
        }

        let mut outcome = CancellationOutcome {
            payment_status: consultation.payment_status,
            refund: None,
            reversal: None,
            reversal_clamped: false,
        };

        if consultation.payment_status == PaymentStatus::Paid {
            let refund_amount = consultation.price;

            let client: Option<(i32, Decimal)> =
                sqlx::query_as("SELECT id, balance FROM users WHERE id = $1 FOR UPDATE")
                    .bind(consultation.client_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            match client {
                Some((client_id, _)) => {
                    sqlx::query(
                        "UPDATE users SET balance = balance + $1, updated_at = NOW() WHERE id = $2",
                    )
                    .bind(refund_amount)
                    .bind(client_id)
                    .execute(&mut *tx)
                    .await?;
                    outcome.payment_status = PaymentStatus::Refunded;
                    outcome.refund = Some(refund_amount);
                }
                None => {
                    // Never drop the refund obligation silently.
                    log::error!(
                        "Client {} missing while refunding consultation {}, queued for manual refund",
                        consultation.client_id,
                        consultation_id
                    );
                    outcome.payment_status = PaymentStatus::RefundPendingManual;
                }
            }

            let lawyer: Option<(i32, Decimal)> =
                sqlx::query_as("SELECT id, balance FROM users WHERE id = $1 FOR UPDATE")
                    .bind(consultation.lawyer_user_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            if let Some((lawyer_id, balance)) = lawyer {
                let to_reverse = lawyer_earnings(refund_amount, self.config.commission_rate);
                // Balance never goes negative. Clamping can under-recover
                // an already-withdrawn payout; that gap is reported, not
                // papered over.
                let debited = to_reverse.min(balance).max(Decimal::ZERO);
                outcome.reversal_clamped = debited < to_reverse;

                sqlx::query(
                    "UPDATE users SET balance = balance - $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(debited)
                .bind(lawyer_id)
                .execute(&mut *tx)
                .await?;
                outcome.reversal = Some(debited);

                if outcome.reversal_clamped {
                    log::warn!(
                        "Lawyer {} balance {} could not cover reversal {} for consultation {}",
                        lawyer_id,
                        balance,
                        to_reverse,
                        consultation_id
                    );
                }
            } else {
                log::error!(
                    "Lawyer {} missing while reversing earnings for consultation {}",
                    consultation.lawyer_user_id,
                    consultation_id
                );
            }
        }

        sqlx::query(
            r#"
            UPDATE consultations
            SET status = 'cancelled',
                payment_status = $1,
                slot_id = NULL,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(outcome.payment_status.as_str())
        .bind(consultation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "Consultation {} cancelled by user {} ({:?})",
            consultation_id,
            actor.user_id,
            actor.role
        );

        let message = match outcome.refund {
            Some(amount) => format!(
                "Consultation {} cancelled, {} refunded to the client",
                consultation_id, amount
            ),
            None => format!("Consultation {} cancelled, nothing to refund", consultation_id),
        };
        notify_best_effort(self.notifier.as_ref(), &message);

        Ok(outcome)
    }
}
