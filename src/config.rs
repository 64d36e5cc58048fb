use chrono::Weekday;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;

/// Engine-wide settings. Passed explicitly into the generator and the
/// settlement/cancellation components instead of living as globals.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Platform cut of every consultation price.
    pub commission_rate: Decimal,
    /// Start hours of bookable one-hour slots, provider-local business day.
    pub work_hours: Vec<u32>,
    /// Hours generated as `break`, never bookable.
    pub lunch_break: Vec<u32>,
    /// Days with no slot generation at all.
    pub weekend: Vec<Weekday>,
    /// How far ahead the catch-up job keeps every lawyer's calendar filled.
    pub horizon_days: i64,
    /// ISO currency code handed to the payment gateway.
    pub currency: String,
    /// Shared secret for verifying signed gateway events.
    pub webhook_secret: String,
    /// Unpaid pending bookings older than this get swept and their slot freed.
    pub stale_booking_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commission_rate: dec!(0.10),
            work_hours: (9..18).collect(),
            lunch_break: vec![13],
            weekend: vec![Weekday::Sat, Weekday::Sun],
            horizon_days: 1,
            currency: "usd".to_string(),
            webhook_secret: String::new(),
            stale_booking_minutes: 30,
        }
    }
}

/// Parses a comma-separated list of hours ("9,10,11"). Rejects empty
/// lists and anything outside 0..24.
fn parse_hours(raw: &str) -> Option<Vec<u32>> {
    let hours: Option<Vec<u32>> = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>().ok().filter(|h| *h < 24))
        .collect();
    hours.filter(|hours| !hours.is_empty())
}

impl EngineConfig {
    /// Reads overrides from the environment, keeping defaults for the
    /// rest. The weekend set stays code-level configuration.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var("WORK_HOURS") {
            match parse_hours(&raw) {
                Some(hours) => config.work_hours = hours,
                None => log::warn!("Ignoring invalid WORK_HOURS value: {}", raw),
            }
        }
        if let Ok(raw) = env::var("LUNCH_BREAK_HOURS") {
            match parse_hours(&raw) {
                Some(hours) => config.lunch_break = hours,
                None => log::warn!("Ignoring invalid LUNCH_BREAK_HOURS value: {}", raw),
            }
        }
        if let Ok(rate) = env::var("COMMISSION_RATE") {
            match rate.parse::<Decimal>() {
                Ok(parsed) if parsed >= Decimal::ZERO && parsed < Decimal::ONE => {
                    config.commission_rate = parsed;
                }
                _ => log::warn!("Ignoring invalid COMMISSION_RATE value: {}", rate),
            }
        }
        if let Ok(days) = env::var("SLOT_HORIZON_DAYS") {
            if let Ok(parsed) = days.parse::<i64>() {
                config.horizon_days = parsed.max(1);
            }
        }
        if let Ok(minutes) = env::var("STALE_BOOKING_MINUTES") {
            if let Ok(parsed) = minutes.parse::<i64>() {
                config.stale_booking_minutes = parsed.max(1);
            }
        }
        if let Ok(currency) = env::var("CHECKOUT_CURRENCY") {
            config.currency = currency.to_lowercase();
        }
        if let Ok(secret) = env::var("GATEWAY_WEBHOOK_SECRET") {
            config.webhook_secret = secret;
        }

        config
    }

    pub fn is_business_day(&self, weekday: Weekday) -> bool {
        !self.weekend.contains(&weekday)
    }

    pub fn is_break_hour(&self, hour: u32) -> bool {
        self.lunch_break.contains(&hour)
    }
}
