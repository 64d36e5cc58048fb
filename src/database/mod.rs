use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::EngineResult;

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> EngineResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn init(&self) -> EngineResult<()> {
        // Unified user table: clients, lawyers and admins share it,
        // lawyer profile columns stay NULL for the rest.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                fullname TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'Client',
                balance NUMERIC(12, 2) NOT NULL DEFAULT 0,
                experience TEXT,
                specialization TEXT,
                price NUMERIC(12, 2),
                description TEXT,
                photo_url TEXT,
                zoom_link TEXT,
                office_address TEXT,
                is_on_main BOOLEAN NOT NULL DEFAULT false,
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // One row per (lawyer, hour). The unique key is what makes slot
        // generation idempotent.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS time_slots (
                id SERIAL PRIMARY KEY,
                lawyer_id INTEGER NOT NULL REFERENCES users (id),
                slot_datetime TIMESTAMP WITH TIME ZONE NOT NULL,
                status TEXT NOT NULL DEFAULT 'available',
                consultation_id INTEGER,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                UNIQUE (lawyer_id, slot_datetime)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS consultations (
                id SERIAL PRIMARY KEY,
                client_id INTEGER NOT NULL REFERENCES users (id),
                lawyer_user_id INTEGER NOT NULL REFERENCES users (id),
                date TIMESTAMP WITH TIME ZONE NOT NULL,
                type TEXT NOT NULL DEFAULT 'Online',
                status TEXT NOT NULL DEFAULT 'pending',
                payment_status TEXT NOT NULL DEFAULT 'unpaid',
                price NUMERIC(12, 2) NOT NULL,
                meeting_url TEXT,
                location_gmaps TEXT,
                slot_id INTEGER REFERENCES time_slots (id),
                location_pending BOOLEAN NOT NULL DEFAULT false,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id SERIAL PRIMARY KEY,
                consultation_id INTEGER NOT NULL UNIQUE REFERENCES consultations (id),
                client_id INTEGER NOT NULL REFERENCES users (id),
                lawyer_user_id INTEGER NOT NULL REFERENCES users (id),
                rating SMALLINT NOT NULL,
                text TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_role ON users (role)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_time_slots_lawyer_time ON time_slots (lawyer_id, slot_datetime)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_time_slots_status ON time_slots (status)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_consultations_client ON consultations (client_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_consultations_lawyer ON consultations (lawyer_user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_consultations_status ON consultations (status, payment_status)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reviews_lawyer ON reviews (lawyer_user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
