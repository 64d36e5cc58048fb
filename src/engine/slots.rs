use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::config::EngineConfig;
use crate::database::Database;
use crate::error::EngineResult;
use crate::models::time_slot::TimeSlotRow;
use crate::models::{SlotStatus, TimeSlot};

/// Produces the universe of bookable hours for each lawyer from the
/// fixed weekly template and keeps the look-ahead horizon filled.
#[derive(Clone)]
pub struct SlotGenerator {
    db: Database,
    config: EngineConfig,
}

impl SlotGenerator {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self { db, config }
    }

    /// Enumerates the (timestamp, status) pairs the template yields for
    /// an inclusive date range. Weekend days produce nothing; the lunch
    /// hour comes out as `break`, everything else as `available`.
    pub fn plan(&self, start_date: NaiveDate, end_date: NaiveDate) -> Vec<(DateTime<Utc>, SlotStatus)> {
        let mut planned = Vec::new();
        let mut current = start_date;

        while current <= end_date {
            if self.config.is_business_day(current.weekday()) {
                for &hour in &self.config.work_hours {
                    let Some(naive) = current.and_hms_opt(hour, 0, 0) else {
                        log::warn!("Skipping invalid work hour {} in template", hour);
                        continue;
                    };
                    let status = if self.config.is_break_hour(hour) {
                        SlotStatus::Break
                    } else {
                        SlotStatus::Available
                    };
                    planned.push((naive.and_utc(), status));
                }
            }
            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        planned
    }

    /// Creates every missing slot for the range in one transaction.
    /// Existing (lawyer, timestamp) rows are left untouched, so the call
    /// is safe to repeat over overlapping ranges. Returns the number of
    /// rows actually inserted.
    pub async fn generate(
        &self,
        lawyer_id: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<u64> {
        let planned = self.plan(start_date, end_date);
        if planned.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool.begin().await?;
        let mut inserted = 0u64;

        for (slot_datetime, status) in &planned {
            let result = sqlx::query(
                r#"
                INSERT INTO time_slots (lawyer_id, slot_datetime, status)
                VALUES ($1, $2, $3)
                ON CONFLICT (lawyer_id, slot_datetime) DO NOTHING
                "#,
            )
            .bind(lawyer_id)
            .bind(slot_datetime)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        log::info!(
            "Generated {} new slots for lawyer {} ({} .. {})",
            inserted,
            lawyer_id,
            start_date,
            end_date
        );

        Ok(inserted)
    }

    /// Catch-up pass over every active lawyer: whoever's latest slot does
    /// not reach `as_of + 1 day` gets the gap generated up to the
    /// configured horizon. Scheduled independently of booking traffic.
    pub async fn fill_horizon(&self, as_of: NaiveDate) -> EngineResult<()> {
        let lawyers: Vec<(i32,)> = sqlx::query_as(
            "SELECT id FROM users WHERE role = 'Lawyer' AND is_active = true",
        )
        .fetch_all(&self.db.pool)
        .await?;

        let target = as_of + Duration::days(self.config.horizon_days);

        for (lawyer_id,) in lawyers {
            let latest: Option<(DateTime<Utc>,)> = sqlx::query_as(
                r#"
                SELECT slot_datetime FROM time_slots
                WHERE lawyer_id = $1
                ORDER BY slot_datetime DESC
                LIMIT 1
                "#,
            )
            .bind(lawyer_id)
            .fetch_optional(&self.db.pool)
            .await?;

            let from = match latest {
                Some((ts,)) => match ts.date_naive().succ_opt() {
                    Some(next) => next.max(as_of),
                    None => continue,
                },
                None => as_of,
            };

            if from <= target {
                self.generate(lawyer_id, from, target).await?;
            }
        }

        Ok(())
    }

    /// Every slot of one lawyer's day, regardless of status. The view
    /// layer derives `expired` for past availability.
    pub async fn day_slots(&self, lawyer_id: i32, day: NaiveDate) -> EngineResult<Vec<TimeSlot>> {
        let rows: Vec<TimeSlotRow> = sqlx::query_as(
            r#"
            SELECT id, lawyer_id, slot_datetime, status, consultation_id
            FROM time_slots
            WHERE lawyer_id = $1
              AND slot_datetime >= $2
              AND slot_datetime < $3
            ORDER BY slot_datetime ASC
            "#,
        )
        .bind(lawyer_id)
        .bind(day.and_hms_opt(0, 0, 0).map(|n| n.and_utc()))
        .bind((day + Duration::days(1)).and_hms_opt(0, 0, 0).map(|n| n.and_utc()))
        .fetch_all(&self.db.pool)
        .await?;

        Ok(rows.into_iter().map(TimeSlot::from).collect())
    }

    /// Bookable slots only: still `available` and still in the future.
    pub async fn available_slots(
        &self,
        lawyer_id: i32,
        day: NaiveDate,
    ) -> EngineResult<Vec<TimeSlot>> {
        let slots = self.day_slots(lawyer_id, day).await?;
        let now = Utc::now();
        Ok(slots
            .into_iter()
            .filter(|slot| slot.status == SlotStatus::Available && slot.slot_datetime > now)
            .collect())
    }
}
