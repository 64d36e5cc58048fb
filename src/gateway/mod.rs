use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::Consultation;

type HmacSha256 = Hmac<Sha256>;

/// Event type that confirms a paid checkout.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Everything the route layer needs to open a gateway checkout session.
/// Built only after the reservation has committed locally; a gateway
/// failure after this point leaves a pending/unpaid booking for the
/// stale-booking sweep, never a half-committed transaction.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub consultation_id: i32,
    /// Amount in minor currency units (cents).
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub success_ref: String,
    pub cancel_ref: String,
}

impl CheckoutRequest {
    pub fn new(
        consultation: &Consultation,
        lawyer_name: &str,
        currency: &str,
    ) -> EngineResult<Self> {
        let amount_minor = (consultation.price * dec!(100))
            .round_dp(0)
            .to_i64()
            .ok_or_else(|| {
                EngineError::Gateway(format!(
                    "price {} cannot be expressed in minor units",
                    consultation.price
                ))
            })?;

        Ok(Self {
            consultation_id: consultation.id,
            amount_minor,
            currency: currency.to_string(),
            description: format!(
                "Consultation with {} ({}) on {}",
                lawyer_name,
                consultation.consultation_type.as_str(),
                consultation.date.format("%Y-%m-%d %H:%M"),
            ),
            success_ref: format!(
                "/consultation/payment/success?consultation_id={}",
                consultation.id
            ),
            cancel_ref: format!(
                "/consultation/payment/cancel?consultation_id={}",
                consultation.id
            ),
        })
    }
}

/// A verified asynchronous gateway event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub event_type: String,
    pub consultation_id: Option<i32>,
}

impl WebhookEvent {
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_COMPLETED
    }
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<RawData>,
}

#[derive(Deserialize)]
struct RawData {
    object: RawObject,
}

#[derive(Deserialize)]
struct RawObject {
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

/// Checks the gateway signature header (`t=<ts>,v1=<hex>`) against the
/// shared secret: HMAC-SHA256 over `"<ts>.<payload>"`, compared in
/// constant time. A mismatch rejects the event before any state moves.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &str) -> EngineResult<()> {
    let mut timestamp = None;
    let mut signature = None;

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(v)) => (t, v),
        _ => return Err(EngineError::Gateway("malformed signature header".into())),
    };

    let expected = hex::decode(signature)
        .map_err(|_| EngineError::Gateway("signature is not valid hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| EngineError::Gateway("invalid webhook secret".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    mac.verify_slice(&expected)
        .map_err(|_| EngineError::Gateway("signature mismatch".into()))
}

pub fn parse_event(payload: &[u8]) -> EngineResult<WebhookEvent> {
    let raw: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| EngineError::Gateway(format!("unparseable event payload: {}", e)))?;

    let consultation_id = raw
        .data
        .and_then(|data| data.object.metadata)
        .and_then(|metadata| metadata.get("consultation_id").cloned())
        .and_then(|id| id.parse::<i32>().ok());

    Ok(WebhookEvent {
        event_type: raw.event_type,
        consultation_id,
    })
}

/// Signature check plus parse in one step; the webhook route should call
/// nothing else before this.
pub fn verified_event(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> EngineResult<WebhookEvent> {
    verify_signature(payload, signature_header, secret)?;
    parse_event(payload)
}
