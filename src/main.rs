use std::env;
use std::time::Duration;
use tokio::time;

use juristhub_engine::{Database, EngineConfig, ReservationEngine, SlotGenerator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting JuristHUB booking engine...");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = Database::new(&database_url).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    let config = EngineConfig::from_env();
    if config.webhook_secret.is_empty() {
        log::warn!("GATEWAY_WEBHOOK_SECRET is not set, webhook events cannot be verified");
    }

    // Keeps every lawyer's calendar generated out to the horizon.
    let generator = SlotGenerator::new(db.clone(), config.clone());
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let today = chrono::Utc::now().date_naive();
            if let Err(e) = generator.fill_horizon(today).await {
                log::error!("Slot horizon catch-up failed: {}", e);
            }
        }
    });

    // Sweeps checkouts abandoned after the reservation committed.
    let reservations = ReservationEngine::new(db.clone(), config.clone());
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match reservations.release_stale_pending().await {
                Ok(0) => {}
                Ok(released) => log::info!("Released {} stale pending bookings", released),
                Err(e) => log::error!("Stale booking sweep failed: {}", e),
            }
        }
    });

    log::info!("🚀 Background schedulers running, waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");

    Ok(())
}
