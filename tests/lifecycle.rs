//! End-to-end booking lifecycle scenarios against a real Postgres.
//! Run with a live database:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -- --ignored
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use juristhub_engine::models::{Actor, ConsultationStatus, ConsultationType, PaymentStatus, Role};
use juristhub_engine::notify::LogNotifier;
use juristhub_engine::{
    CancellationEngine, Database, EngineConfig, EngineError, ReservationEngine, SettlementEngine,
    SlotGenerator,
};

async fn setup() -> (Database, EngineConfig) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for DB tests");
    let db = Database::new(&url).await.expect("connect");
    db.init().await.expect("schema");
    (db, EngineConfig::default())
}

fn unique_email(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}+{}@test.local", prefix, nanos)
}

async fn seed_user(db: &Database, role: Role, price: Option<Decimal>) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO users (fullname, email, password_hash, role, balance, price, zoom_link, office_address)
        VALUES ($1, $2, 'x', $3, 0, $4, 'https://meet.test/room', 'Main St 1')
        RETURNING id
        "#,
    )
    .bind(format!("{:?} Test", role))
    .bind(unique_email(role.as_str()))
    .bind(role.as_str())
    .bind(price)
    .fetch_one(&db.pool)
    .await
    .expect("seed user");
    id
}

async fn balance_of(db: &Database, user_id: i32) -> Decimal {
    let (balance,): (Decimal,) = sqlx::query_as("SELECT balance FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&db.pool)
        .await
        .expect("balance");
    balance
}

async fn slot_status(db: &Database, lawyer_id: i32, at: chrono::DateTime<Utc>) -> String {
    let (status,): (String,) = sqlx::query_as(
        "SELECT status FROM time_slots WHERE lawyer_id = $1 AND slot_datetime = $2",
    )
    .bind(lawyer_id)
    .bind(at)
    .fetch_one(&db.pool)
    .await
    .expect("slot");
    status
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn generation_is_idempotent_and_respects_the_template() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(100.00))).await;
    let generator = SlotGenerator::new(db.clone(), config);

    let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let first = generator.generate(lawyer, monday, monday).await.unwrap();
    assert_eq!(first, 9);

    // Same range again: nothing new.
    let second = generator.generate(lawyer, monday, monday).await.unwrap();
    assert_eq!(second, 0);

    let slots = generator.day_slots(lawyer, monday).await.unwrap();
    assert_eq!(slots.len(), 9);
    let breaks = slots
        .iter()
        .filter(|s| s.status == juristhub_engine::models::SlotStatus::Break)
        .count();
    assert_eq!(breaks, 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn concurrent_reservations_yield_exactly_one_winner() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(100.00))).await;
    let generator = SlotGenerator::new(db.clone(), config.clone());

    let day = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    generator.generate(lawyer, day, day).await.unwrap();
    let at = Utc.with_ymd_and_hms(2025, 11, 5, 14, 0, 0).unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let engine = ReservationEngine::new(db.clone(), config.clone());
        let client = seed_user(&db, Role::Client, None).await;
        handles.push(tokio::spawn(async move {
            engine
                .reserve(client, lawyer, at, ConsultationType::Online)
                .await
        }));
    }

    let mut won = 0;
    let mut lost = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(EngineError::SlotUnavailable) => lost += 1,
            Err(other) => panic!("unexpected failure kind: {}", other),
        }
    }
    assert_eq!(won, 1);
    assert_eq!(lost, 4);
    assert_eq!(slot_status(&db, lawyer, at).await, "booked");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn settlement_is_idempotent_and_cancellation_reverses_it() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(100.00))).await;
    let client = seed_user(&db, Role::Client, None).await;
    let notifier = Arc::new(LogNotifier);

    let generator = SlotGenerator::new(db.clone(), config.clone());
    let reservations = ReservationEngine::new(db.clone(), config.clone());
    let settlement = SettlementEngine::new(db.clone(), config.clone(), notifier.clone());
    let cancellation = CancellationEngine::new(db.clone(), config.clone(), notifier);

    let day = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    generator.generate(lawyer, day, day).await.unwrap();
    let at = Utc.with_ymd_and_hms(2025, 11, 5, 14, 0, 0).unwrap();

    let consultation_id = reservations
        .reserve(client, lawyer, at, ConsultationType::Online)
        .await
        .unwrap();

    // Webhook and redirect both land; the lawyer is credited once.
    settlement.confirm_payment(consultation_id).await.unwrap();
    settlement.confirm_payment(consultation_id).await.unwrap();
    assert_eq!(balance_of(&db, lawyer).await, dec!(90.00));

    let consultation = reservations.get(consultation_id).await.unwrap();
    assert_eq!(consultation.status, ConsultationStatus::Scheduled);
    assert_eq!(consultation.payment_status, PaymentStatus::Paid);
    assert_eq!(consultation.price, dec!(100.00));
    assert_eq!(consultation.meeting_url.as_deref(), Some("https://meet.test/room"));

    // Client cancels: full refund, commission-adjusted reversal, slot freed.
    let actor = Actor {
        user_id: client,
        role: Role::Client,
    };
    let outcome = cancellation.cancel(consultation_id, &actor).await.unwrap();
    assert_eq!(outcome.refund, Some(dec!(100.00)));
    assert_eq!(outcome.reversal, Some(dec!(90.00)));
    assert!(!outcome.reversal_clamped);

    assert_eq!(balance_of(&db, client).await, dec!(100.00));
    assert_eq!(balance_of(&db, lawyer).await, dec!(0.00));
    assert_eq!(slot_status(&db, lawyer, at).await, "available");

    let consultation = reservations.get(consultation_id).await.unwrap();
    assert_eq!(consultation.status, ConsultationStatus::Cancelled);
    assert_eq!(consultation.payment_status, PaymentStatus::Refunded);
    assert_eq!(consultation.slot_id, None);

    // Terminal state: a second cancel is rejected.
    let again = cancellation.cancel(consultation_id, &actor).await;
    assert!(matches!(again, Err(EngineError::InvalidTransition(_))));
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn reserving_a_nonexistent_slot_fails_with_slot_unavailable() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(100.00))).await;
    let client = seed_user(&db, Role::Client, None).await;
    let reservations = ReservationEngine::new(db.clone(), config);

    // No generation ran for this date at all.
    let at = Utc.with_ymd_and_hms(2030, 3, 4, 10, 0, 0).unwrap();
    let result = reservations
        .reserve(client, lawyer, at, ConsultationType::Offline)
        .await;
    assert!(matches!(result, Err(EngineError::SlotUnavailable)));
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn unpaid_cancellation_moves_no_money() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(80.00))).await;
    let client = seed_user(&db, Role::Client, None).await;
    let notifier = Arc::new(LogNotifier);

    let generator = SlotGenerator::new(db.clone(), config.clone());
    let reservations = ReservationEngine::new(db.clone(), config.clone());
    let cancellation = CancellationEngine::new(db.clone(), config.clone(), notifier);

    let day = NaiveDate::from_ymd_opt(2025, 11, 6).unwrap();
    generator.generate(lawyer, day, day).await.unwrap();
    let at = Utc.with_ymd_and_hms(2025, 11, 6, 9, 0, 0).unwrap();

    let consultation_id = reservations
        .reserve(client, lawyer, at, ConsultationType::Offline)
        .await
        .unwrap();

    let actor = Actor {
        user_id: lawyer,
        role: Role::Lawyer,
    };
    let outcome = cancellation.cancel(consultation_id, &actor).await.unwrap();
    assert_eq!(outcome.refund, None);
    assert_eq!(outcome.reversal, None);
    assert_eq!(outcome.payment_status, PaymentStatus::Unpaid);

    assert_eq!(balance_of(&db, client).await, dec!(0.00));
    assert_eq!(balance_of(&db, lawyer).await, dec!(0.00));
    assert_eq!(slot_status(&db, lawyer, at).await, "available");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn break_slot_can_never_be_reserved() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(100.00))).await;
    let client = seed_user(&db, Role::Client, None).await;
    let generator = SlotGenerator::new(db.clone(), config.clone());
    let reservations = ReservationEngine::new(db.clone(), config);

    let monday = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();
    generator.generate(lawyer, monday, monday).await.unwrap();
    let lunch = Utc.with_ymd_and_hms(2025, 11, 10, 13, 0, 0).unwrap();
    assert_eq!(slot_status(&db, lawyer, lunch).await, "break");

    let result = reservations
        .reserve(client, lawyer, lunch, ConsultationType::Online)
        .await;
    assert!(matches!(result, Err(EngineError::SlotUnavailable)));

    // The break hour never transitions, not even on a failed claim.
    assert_eq!(slot_status(&db, lawyer, lunch).await, "break");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn confirming_a_cancelled_booking_fails_and_moves_no_money() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(100.00))).await;
    let client = seed_user(&db, Role::Client, None).await;
    let notifier = Arc::new(LogNotifier);

    let generator = SlotGenerator::new(db.clone(), config.clone());
    let reservations = ReservationEngine::new(db.clone(), config.clone());
    let settlement = SettlementEngine::new(db.clone(), config.clone(), notifier.clone());
    let cancellation = CancellationEngine::new(db.clone(), config.clone(), notifier);

    let day = NaiveDate::from_ymd_opt(2025, 11, 11).unwrap();
    generator.generate(lawyer, day, day).await.unwrap();
    let at = Utc.with_ymd_and_hms(2025, 11, 11, 10, 0, 0).unwrap();

    let consultation_id = reservations
        .reserve(client, lawyer, at, ConsultationType::Online)
        .await
        .unwrap();

    let actor = Actor {
        user_id: client,
        role: Role::Client,
    };
    cancellation.cancel(consultation_id, &actor).await.unwrap();

    // The gateway confirmation lost the race against the cancel: it
    // must fail cleanly instead of paying a dead booking.
    let result = settlement.confirm_payment(consultation_id).await;
    assert!(matches!(result, Err(EngineError::InvalidTransition(_))));

    assert_eq!(balance_of(&db, lawyer).await, dec!(0.00));
    assert_eq!(balance_of(&db, client).await, dec!(0.00));

    let consultation = reservations.get(consultation_id).await.unwrap();
    assert_eq!(consultation.status, ConsultationStatus::Cancelled);
    assert_eq!(consultation.payment_status, PaymentStatus::Unpaid);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn stranger_cannot_cancel_someone_elses_booking() {
    let (db, config) = setup().await;
    let lawyer = seed_user(&db, Role::Lawyer, Some(dec!(50.00))).await;
    let client = seed_user(&db, Role::Client, None).await;
    let stranger = seed_user(&db, Role::Client, None).await;
    let notifier = Arc::new(LogNotifier);

    let generator = SlotGenerator::new(db.clone(), config.clone());
    let reservations = ReservationEngine::new(db.clone(), config.clone());
    let cancellation = CancellationEngine::new(db.clone(), config.clone(), notifier);

    let day = NaiveDate::from_ymd_opt(2025, 11, 7).unwrap();
    generator.generate(lawyer, day, day).await.unwrap();
    let at = Utc.with_ymd_and_hms(2025, 11, 7, 11, 0, 0).unwrap();

    let consultation_id = reservations
        .reserve(client, lawyer, at, ConsultationType::Online)
        .await
        .unwrap();

    let actor = Actor {
        user_id: stranger,
        role: Role::Client,
    };
    let result = cancellation.cancel(consultation_id, &actor).await;
    assert!(matches!(result, Err(EngineError::AuthorizationDenied)));
    assert_eq!(slot_status(&db, lawyer, at).await, "booked");
}
