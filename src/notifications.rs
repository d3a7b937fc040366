// Copyright (c) Memberpay Team
// SPDX-License-Identifier: Apache-2.0

//! Inbound payment-notification envelopes.
//!
//! Notifications arrive either as a plain JSON POST from the processor or as a
//! bus message whose `message.data` field carries the same JSON base64-encoded.
//! Both shapes decode to [`NotificationEnvelope`]. The envelope is only
//! trusted after its HMAC signature has been verified against the raw body.

use anyhow::{Context, Result};
use base64::Engine;
use bigdecimal::BigDecimal;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::str::FromStr;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    pub event_type: String,
    pub resource: Option<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub id: Option<String>,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
    pub payer: Option<Payer>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    pub reference_id: Option<String>,
    pub custom_id: Option<String>,
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payer {
    pub email_address: Option<String>,
}

/// What the handler should do with a given event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Completed/approved payment, proceed to reconciliation.
    Reconcile,
    /// Capture was denied, log only.
    LogDenied,
    /// Subscription ended upstream, log only.
    LogSubscriptionEnded,
    /// Unrecognized event type, log and acknowledge.
    Ignore,
}

pub fn classify(event_type: &str) -> Disposition {
    match event_type {
        "PAYMENT.CAPTURE.COMPLETED" | "CHECKOUT.ORDER.APPROVED" => Disposition::Reconcile,
        "PAYMENT.CAPTURE.DENIED" => Disposition::LogDenied,
        "BILLING.SUBSCRIPTION.CANCELLED" | "BILLING.SUBSCRIPTION.EXPIRED" => {
            Disposition::LogSubscriptionEnded
        }
        _ => Disposition::Ignore,
    }
}

/// The fields reconciliation needs, pulled out of a completed-payment
/// notification. `None` means the envelope is missing or malformed in a way
/// that makes mutation impossible; callers acknowledge and move on.
#[derive(Debug, Clone)]
pub struct CompletedPayment {
    pub order_id: String,
    pub user_id: String,
    pub salesperson_id: Option<String>,
    pub payer_email: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
}

impl NotificationEnvelope {
    pub fn completed_payment(&self) -> Option<CompletedPayment> {
        let resource = self.resource.as_ref()?;
        let order_id = resource.id.clone()?;
        let unit = resource.purchase_units.first()?;
        let user_id = unit.reference_id.clone()?;
        let amount = unit.amount.as_ref()?;
        let value = BigDecimal::from_str(&amount.value).ok()?;

        Some(CompletedPayment {
            order_id,
            user_id,
            salesperson_id: unit.custom_id.clone().filter(|s| !s.is_empty()),
            payer_email: resource
                .payer
                .as_ref()
                .and_then(|p| p.email_address.clone()),
            amount: value,
            currency: amount.currency_code.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct BusEnvelope {
    message: BusMessage,
}

#[derive(Debug, Deserialize)]
struct BusMessage {
    data: String,
}

/// Decode a raw webhook body into a notification. Accepts both the direct
/// JSON shape and the base64 bus envelope.
pub fn parse_notification(body: &[u8]) -> Result<NotificationEnvelope> {
    if let Ok(bus) = serde_json::from_slice::<BusEnvelope>(body) {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(bus.message.data.as_bytes())
            .context("Bus message data is not valid base64")?;
        return serde_json::from_slice(&decoded)
            .context("Bus message payload is not a valid notification");
    }

    serde_json::from_slice(body).context("Body is not a valid notification")
}

type HmacSha256 = Hmac<Sha256>;

/// Verify the HMAC-SHA256 signature of the raw body. Comparison happens via
/// `Mac::verify_slice`, which is constant-time. An empty secret never
/// verifies: anyone can sign with the empty key.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completed_body() -> Vec<u8> {
        json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "ORDER-123",
                "status": "COMPLETED",
                "purchase_units": [{
                    "reference_id": "user-42",
                    "custom_id": "rep-7",
                    "amount": { "value": "100.00", "currency_code": "USD" }
                }],
                "payer": { "email_address": "member@example.com" }
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn direct_json_body_parses() {
        let envelope = parse_notification(&completed_body()).unwrap();
        assert_eq!(envelope.event_type, "PAYMENT.CAPTURE.COMPLETED");
        let payment = envelope.completed_payment().unwrap();
        assert_eq!(payment.order_id, "ORDER-123");
        assert_eq!(payment.user_id, "user-42");
        assert_eq!(payment.salesperson_id.as_deref(), Some("rep-7"));
        assert_eq!(payment.amount, BigDecimal::from_str("100.00").unwrap());
        assert_eq!(payment.currency, "USD");
    }

    #[test]
    fn bus_envelope_decodes_to_same_notification() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(completed_body());
        let body = json!({ "message": { "data": encoded } }).to_string();

        let envelope = parse_notification(body.as_bytes()).unwrap();
        let payment = envelope.completed_payment().unwrap();
        assert_eq!(payment.order_id, "ORDER-123");
        assert_eq!(payment.payer_email.as_deref(), Some("member@example.com"));
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(parse_notification(b"not json at all").is_err());

        let bad_base64 = json!({ "message": { "data": "!!!" } }).to_string();
        assert!(parse_notification(bad_base64.as_bytes()).is_err());
    }

    #[test]
    fn event_types_are_classified() {
        assert_eq!(classify("PAYMENT.CAPTURE.COMPLETED"), Disposition::Reconcile);
        assert_eq!(classify("CHECKOUT.ORDER.APPROVED"), Disposition::Reconcile);
        assert_eq!(classify("PAYMENT.CAPTURE.DENIED"), Disposition::LogDenied);
        assert_eq!(
            classify("BILLING.SUBSCRIPTION.CANCELLED"),
            Disposition::LogSubscriptionEnded
        );
        assert_eq!(
            classify("BILLING.SUBSCRIPTION.EXPIRED"),
            Disposition::LogSubscriptionEnded
        );
        assert_eq!(classify("SOMETHING.ELSE"), Disposition::Ignore);
    }

    #[test]
    fn missing_reference_yields_no_payment() {
        let body = json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "ORDER-123",
                "purchase_units": [{
                    "amount": { "value": "100.00", "currency_code": "USD" }
                }]
            }
        })
        .to_string();

        let envelope = parse_notification(body.as_bytes()).unwrap();
        assert!(envelope.completed_payment().is_none());
    }

    #[test]
    fn unparseable_amount_yields_no_payment() {
        let body = json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "ORDER-123",
                "purchase_units": [{
                    "reference_id": "user-42",
                    "amount": { "value": "one hundred", "currency_code": "USD" }
                }]
            }
        })
        .to_string();

        let envelope = parse_notification(body.as_bytes()).unwrap();
        assert!(envelope.completed_payment().is_none());
    }

    #[test]
    fn empty_custom_id_is_treated_as_absent() {
        let body = json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "ORDER-123",
                "purchase_units": [{
                    "reference_id": "user-42",
                    "custom_id": "",
                    "amount": { "value": "50.00", "currency_code": "USD" }
                }]
            }
        })
        .to_string();

        let envelope = parse_notification(body.as_bytes()).unwrap();
        assert!(envelope.completed_payment().unwrap().salesperson_id.is_none());
    }

    #[test]
    fn empty_secret_never_verifies() {
        let body = completed_body();
        // A correctly computed empty-key HMAC must still be rejected.
        let mut mac = HmacSha256::new_from_slice(b"").unwrap();
        mac.update(&body);
        let signature = hex::encode(mac.finalize().into_bytes());
        assert!(!verify_signature("", &body, &signature));
    }

    #[test]
    fn signature_round_trip_verifies() {
        let body = completed_body();
        let mut mac = HmacSha256::new_from_slice(b"topsecret").unwrap();
        mac.update(&body);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature("topsecret", &body, &signature));
        assert!(!verify_signature("othersecret", &body, &signature));
        assert!(!verify_signature("topsecret", b"tampered body", &signature));
        assert!(!verify_signature("topsecret", &body, "zz-not-hex"));
    }
}
