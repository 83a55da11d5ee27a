//! Webhook signature verification and event decoding.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>[,v1=...]`.
//! The signed payload is `{t}.{raw body}`, HMAC-SHA256 with the endpoint
//! secret. Events older than [`TOLERANCE_SECS`] are rejected.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;

use hostdeck_core::{OrderId, OrderStatus};

use super::PaymentError;

/// Maximum age of a signed event, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

/// Verify a webhook signature header against the raw body.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if the header is malformed, the
/// timestamp is outside the tolerance, or no `v1` signature matches.
pub fn verify_signature(
    secret: &SecretString,
    header: &str,
    payload: &[u8],
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignature("Missing timestamp".to_owned()))?;
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| PaymentError::InvalidSignature("Invalid timestamp".to_owned()))?;

    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignature("Missing v1 signature".to_owned()));
    }

    if now.abs_diff(ts) > TOLERANCE_SECS.unsigned_abs() {
        return Err(PaymentError::InvalidSignature(
            "Timestamp outside the tolerance zone".to_owned(),
        ));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if !signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        return Err(PaymentError::InvalidSignature("Signature mismatch".to_owned()));
    }

    tracing::debug!("Webhook signature verified");
    Ok(())
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// A webhook event. Only the checkout-session fields we act on are decoded.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: SessionObject,
}

/// The `data.object` of a checkout-session event.
#[derive(Debug, Default, Deserialize)]
pub struct SessionObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

impl SessionObject {
    /// The order id recorded in the session metadata.
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        self.metadata.get("order_id")?.parse().ok()
    }
}

impl WebhookEvent {
    /// Decode an event body.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidPayload` if the body is not an event.
    pub fn from_slice(body: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(body).map_err(|e| PaymentError::InvalidPayload(e.to_string()))
    }

    /// The order status this event settles to, if it is one we handle.
    #[must_use]
    pub fn order_outcome(&self) -> Option<OrderStatus> {
        match self.event_type.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                Some(OrderStatus::Paid)
            }
            "checkout.session.expired" => Some(OrderStatus::Canceled),
            "checkout.session.async_payment_failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}
