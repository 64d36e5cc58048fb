use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One review per completed consultation, enforced by a unique key on
/// `consultation_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i32,
    pub consultation_id: i32,
    pub client_id: i32,
    pub lawyer_user_id: i32,
    pub rating: i16,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

pub fn rating_in_range(rating: i16) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}
