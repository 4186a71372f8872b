//! Donation Model
//!
//! The donor-facing request, the metadata stored on the payment intent, and
//! the summary read back from it once the payment succeeds.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// Postal address collected by the donation form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} {}",
            self.line1, self.city, self.state, self.postal_code
        )
    }
}

/// How the donor intends to pay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum DonationMethod {
    #[default]
    Card,
    AchCreditTransfer,
}

impl DonationMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::AchCreditTransfer => "ach_credit_transfer",
        }
    }

    /// Label used in email subjects for newly created intents
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::AchCreditTransfer => "ACH",
        }
    }

    pub const fn long_label(self) -> &'static str {
        match self {
            Self::Card => "Credit Card",
            Self::AchCreditTransfer => "ACH Credit Transfer",
        }
    }
}

impl From<&str> for DonationMethod {
    fn from(s: &str) -> Self {
        if s == "ach_credit_transfer" {
            Self::AchCreditTransfer
        } else {
            Self::Card
        }
    }
}

impl From<String> for DonationMethod {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Body of a create-payment-intent call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DonationRequest {
    /// Amount in cents
    pub amount: i64,

    pub name: String,

    pub email: String,

    #[serde(default)]
    pub address: Address,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub method: DonationMethod,
}

impl DonationRequest {
    /// Reject requests Stripe would refuse or the board could not act on
    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0 {
            return Err(PaymentError::InvalidRequest(
                "Donation amount must be positive.".into(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("Donor name is required.".into()));
        }
        if self.email.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("Donor email is required.".into()));
        }
        Ok(())
    }

    /// Metadata attached to the payment intent and read back by the webhook
    pub fn metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            ("name".to_string(), self.name.clone()),
            ("email".to_string(), self.email.clone()),
            ("phone".to_string(), self.phone.clone().unwrap_or_default()),
            ("method".to_string(), self.method.as_str().to_string()),
            ("address".to_string(), self.address.to_string()),
        ])
    }
}

/// What the webhook knows about a completed donation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSummary {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub method: DonationMethod,
    pub amount_cents: i64,
    pub created: DateTime<Utc>,
}

impl DonationSummary {
    /// Rebuild a summary from payment intent metadata
    pub fn from_metadata(
        metadata: &HashMap<String, String>,
        amount_received: i64,
        created: DateTime<Utc>,
    ) -> Self {
        let field = |key: &str| metadata.get(key).cloned().unwrap_or_default();

        Self {
            name: field("name"),
            email: field("email"),
            phone: metadata.get("phone").filter(|p| !p.is_empty()).cloned(),
            address: field("address"),
            method: DonationMethod::from(field("method")),
            amount_cents: amount_received,
            created,
        }
    }
}

/// Format cents as dollars, e.g. `2500` -> `$25.00`
pub fn format_amount(cents: i64) -> String {
    format!("${}", Decimal::new(cents, 2))
}

/// Timestamp format used in notification bodies
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
