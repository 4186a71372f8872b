//! Stripe Webhook Handling
//!
//! Verifies the `Stripe-Signature` header and turns `payment_intent.succeeded`
//! callbacks into board notifications.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::donation::DonationSummary;
use crate::error::{PaymentError, Result};
use crate::notify::{NotificationTemplate, Notifier};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook, in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or_else(|| PaymentError::WebhookSignature("Malformed signature header".into()))?;
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|_| PaymentError::WebhookSignature("Invalid timestamp".into()))?;
                timestamp = Some(t);
            }
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::WebhookSignature("Missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(PaymentError::WebhookSignature("No v1 signature".into()));
    }
    let skew = now
        .timestamp()
        .checked_sub(timestamp)
        .and_then(i64::checked_abs);
    if skew.is_none_or(|skew| skew > tolerance_secs) {
        return Err(PaymentError::WebhookSignature(
            "Timestamp outside the tolerance zone".into(),
        ));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let matched = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(signed_payload.as_bytes());
        mac.verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(PaymentError::WebhookSignature(
            "No signatures found matching the expected signature for payload".into(),
        ))
    }
}

/// The subset of a Stripe event this service reads
#[derive(Clone, Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: StripeEventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Payment intent fields carried by `payment_intent.succeeded`
#[derive(Clone, Debug, Deserialize)]
struct SucceededIntent {
    id: String,
    #[serde(default)]
    amount_received: i64,
    created: i64,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

/// Parse a verified webhook payload
pub fn parse_event(payload: &str) -> Result<StripeEvent> {
    serde_json::from_str(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))
}

/// Outcome of handling a webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Donation paid - board has been notified
    PaymentSucceeded(DonationSummary),

    /// Unhandled event type
    Other { event_type: String },
}

/// Webhook handler
pub struct WebhookHandler<N: Notifier + ?Sized> {
    notifier: Arc<N>,
    templates: Arc<NotificationTemplate>,
    secret: String,
    tolerance_secs: i64,
}

impl<N: Notifier + ?Sized> WebhookHandler<N> {
    pub fn new(
        notifier: Arc<N>,
        templates: Arc<NotificationTemplate>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            templates,
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    #[must_use]
    pub const fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verify webhook signature and parse event
    pub fn construct_event(&self, payload: &str, signature: &str) -> Result<StripeEvent> {
        verify_signature(payload, signature, &self.secret, self.tolerance_secs, Utc::now())?;
        parse_event(payload)
    }

    /// Process a webhook event
    pub async fn handle(&self, event: StripeEvent) -> Result<WebhookEvent> {
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Processing Stripe webhook");

        if event.event_type != PAYMENT_INTENT_SUCCEEDED {
            tracing::debug!(event_type = %event.event_type, "Unhandled webhook event");
            return Ok(WebhookEvent::Other {
                event_type: event.event_type,
            });
        }

        let intent: SucceededIntent = serde_json::from_value(event.data.object)
            .map_err(|e| PaymentError::WebhookParse(format!("Invalid payment intent data: {e}")))?;
        let created = DateTime::from_timestamp(intent.created, 0)
            .ok_or_else(|| PaymentError::WebhookParse("Invalid created timestamp".into()))?;

        let summary = DonationSummary::from_metadata(
            &intent.metadata.unwrap_or_default(),
            intent.amount_received,
            created,
        );

        let message = self.templates.payment_received(&summary);
        match self.notifier.send(&message).await {
            Ok(()) => tracing::info!(
                payment_intent = %intent.id,
                donor = %summary.name,
                amount_cents = summary.amount_cents,
                "Notified board of received donation"
            ),
            Err(e) => tracing::error!(
                payment_intent = %intent.id,
                error = %e,
                "Failed to send donation notification"
            ),
        }

        Ok(WebhookEvent::PaymentSucceeded(summary))
    }
}
