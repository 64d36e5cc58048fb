use crate::database::Database;
use crate::error::{EngineError, EngineResult};
use crate::models::consultation::ConsultationRow;
use crate::models::review::rating_in_range;
use crate::models::{Consultation, ConsultationStatus, Review};

/// Review attachment: one per consultation, client-only, completed-only.
#[derive(Clone)]
pub struct Reviews {
    db: Database,
}

impl Reviews {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn leave_review(
        &self,
        consultation_id: i32,
        client_id: i32,
        rating: i16,
        text: &str,
    ) -> EngineResult<i32> {
        if !rating_in_range(rating) {
            return Err(EngineError::InvalidReview("rating must be between 1 and 5"));
        }

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

        if consultation.client_id != client_id {
            return Err(EngineError::AuthorizationDenied);
        }
        if consultation.status != ConsultationStatus::Completed {
            return Err(EngineError::InvalidTransition(consultation_id));
        }

        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM reviews WHERE consultation_id = $1")
                .bind(consultation_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(EngineError::InvalidReview("consultation already reviewed"));
        }

        // The unique key on consultation_id backs this up if two review
        // submissions race past the check.
        let (review_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO reviews (consultation_id, client_id, lawyer_user_id, rating, text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(consultation_id)
        .bind(client_id)
        .bind(consultation.lawyer_user_id)
        .bind(rating)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "Review {} left on consultation {} (rating {})",
            review_id,
            consultation_id,
            rating
        );

        Ok(review_id)
    }

    pub async fn reviews_for_lawyer(&self, lawyer_id: i32) -> EngineResult<Vec<Review>> {
        let reviews: Vec<Review> = sqlx::query_as(
            r#"
            SELECT id, consultation_id, client_id, lawyer_user_id, rating, text, created_at
            FROM reviews
            WHERE lawyer_user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(lawyer_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(reviews)
    }
}
