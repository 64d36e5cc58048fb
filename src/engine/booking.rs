use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::database::Database;
use crate::error::{EngineError, EngineResult};
use crate::models::consultation::ConsultationRow;
use crate::models::user::UserRow;
use crate::models::{Actor, Consultation, ConsultationStatus, ConsultationType, Role, User};

const SELECT_USER: &str = r#"
    SELECT id, fullname, email, role, balance, experience, specialization,
           price, description, photo_url, zoom_link, office_address,
           is_on_main, is_active, created_at
    FROM users
    WHERE id = $1
"#;

const SELECT_CONSULTATION_FOR_UPDATE: &str = r#"
    SELECT id, client_id, lawyer_user_id, date, type, status, payment_status,
           price, meeting_url, location_gmaps, slot_id, location_pending, created_at
    FROM consultations
    WHERE id = $1
    FOR UPDATE
"#;

/// Claims slots and creates consultations. The claim is a transactional
/// compare-and-set on the slot row, so two concurrent attempts on the
/// same (lawyer, timestamp) pair can never both succeed.
#[derive(Clone)]
pub struct ReservationEngine {
    db: Database,
    config: EngineConfig,
}

impl ReservationEngine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self { db, config }
    }

    /// Books the lawyer's slot at `at` for `client_id` and returns the
    /// new consultation id, to be handed to the checkout collaborator.
    /// The price is snapshotted from the lawyer profile here and never
    /// re-read afterwards.
    pub async fn reserve(
        &self,
        client_id: i32,
        lawyer_id: i32,
        at: DateTime<Utc>,
        modality: ConsultationType,
    ) -> EngineResult<i32> {
        let mut tx = self.db.pool.begin().await?;

        let lawyer: Option<UserRow> = sqlx::query_as(SELECT_USER)
            .bind(lawyer_id)
            .fetch_optional(&mut *tx)
            .await?;
        let lawyer: User = match lawyer {
            Some(row) => row.into(),
            None => return Err(EngineError::NotFound("lawyer")),
        };
        if !lawyer.is_bookable_lawyer() {
            return Err(EngineError::NotFound("lawyer"));
        }

        let price = match lawyer.price {
            Some(price) if price > Decimal::ZERO => price,
            _ => return Err(EngineError::PriceNotConfigured(lawyer_id)),
        };

        // The atomic claim. Zero rows means the slot is missing, a break,
        // or someone else already flipped it.
        let claimed: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE time_slots
            SET status = 'booked'
            WHERE lawyer_id = $1
              AND slot_datetime = $2
              AND status = 'available'
            RETURNING id
            "#,
        )
        .bind(lawyer_id)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;
        let (slot_id,) = claimed.ok_or(EngineError::SlotUnavailable)?;

        let (meeting_url, location_gmaps) = match modality {
            ConsultationType::Online => (lawyer.zoom_link.clone(), None),
            ConsultationType::Offline => (None, lawyer.office_address.clone()),
        };

        let (consultation_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO consultations
                (client_id, lawyer_user_id, date, type, status, payment_status,
                 price, meeting_url, location_gmaps, slot_id)
            VALUES ($1, $2, $3, $4, 'pending', 'unpaid', $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(client_id)
        .bind(lawyer_id)
        .bind(at)
        .bind(modality.as_str())
        .bind(price)
        .bind(&meeting_url)
        .bind(&location_gmaps)
        .bind(slot_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE time_slots SET consultation_id = $1 WHERE id = $2")
            .bind(consultation_id)
            .bind(slot_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        log::info!(
            "✅ Reserved slot {} for client {} with lawyer {} (consultation {})",
            slot_id,
            client_id,
            lawyer_id,
            consultation_id
        );

        Ok(consultation_id)
    }

    pub async fn get(&self, consultation_id: i32) -> EngineResult<Consultation> {
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

        row.map(Consultation::from)
            .ok_or(EngineError::NotFound("consultation"))
    }

    /// Lawyer (or admin) marks a scheduled consultation as held. Unlocks
    /// review creation for the client.
    pub async fn complete(&self, consultation_id: i32, actor: &Actor) -> EngineResult<()> {
        let mut tx = self.db.pool.begin().await?;

        let row: Option<ConsultationRow> = sqlx::query_as(SELECT_CONSULTATION_FOR_UPDATE)
            .bind(consultation_id)
            .fetch_optional(&mut *tx)
            .await?;
        let consultation: Consultation = row
            .map(Consultation::from)
            .ok_or(EngineError::NotFound("consultation"))?;

        let is_own_lawyer =
            actor.role == Role::Lawyer && actor.user_id == consultation.lawyer_user_id;
        if !actor.is_admin() && !is_own_lawyer {
            return Err(EngineError::AuthorizationDenied);
        }

        if consultation.status != ConsultationStatus::Scheduled {
            return Err(EngineError::InvalidTransition(consultation_id));
        }

        sqlx::query(
            "UPDATE consultations SET status = 'completed', updated_at = NOW() WHERE id = $1",
        )
        .bind(consultation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!("Consultation {} marked completed", consultation_id);
        Ok(())
    }

    /// Cleanup path for checkouts abandoned after the reservation was
    /// committed locally: pending/unpaid consultations older than the
    /// configured TTL are cancelled and their slot goes back on sale.
    pub async fn release_stale_pending(&self) -> EngineResult<u64> {
        let mut tx = self.db.pool.begin().await?;

        let stale: Vec<(i32, Option<i32>)> = sqlx::query_as(
            r#"
            SELECT id, slot_id
            FROM consultations
            WHERE status = 'pending'
              AND payment_status = 'unpaid'
              AND created_at < NOW() - make_interval(mins => $1)
            FOR UPDATE
            "#,
        )
        .bind(self.config.stale_booking_minutes as i32)
        .fetch_all(&mut *tx)
        .await?;

        let released = stale.len() as u64;

        for (consultation_id, slot_id) in stale {
            if let Some(slot_id) = slot_id {
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

            sqlx::query(
                r#"
                UPDATE consultations
                SET status = 'cancelled', slot_id = NULL, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(consultation_id)
            .execute(&mut *tx)
            .await?;

            log::info!("🧹 Released stale pending consultation {}", consultation_id);
        }

        tx.commit().await?;

        Ok(released)
    }
}
