//! # givedesk-payments
//!
//! Donation payments and board notifications for givedesk.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐  create intent   ┌─────────┐
//! │ Donation │─────────────────▶│ Stripe  │
//! │   form   │◀─ client secret ─│         │
//! └──────────┘                  └────┬────┘
//!                                    │ payment_intent.succeeded
//!                                    ▼
//!                          ┌──────────────────┐  mail/send  ┌──────────┐
//!                          │  WebhookHandler  │────────────▶│ SendGrid │
//!                          └──────────────────┘             └──────────┘
//! ```
//!
//! The browser confirms the intent itself with Stripe.js using the returned
//! client secret. Nothing here stores state: the donor's details travel on
//! the intent's metadata and come back on the webhook.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use givedesk_payments::{DonationRequest, IntentOptions, StripeClient};
//!
//! let client = StripeClient::new("sk_test_xxx", "whsec_xxx");
//! let created = client
//!     .create_payment_intent(&request, &IntentOptions::default())
//!     .await?;
//!
//! // Hand created.client_secret to Stripe.js
//! ```

mod checkout;
mod donation;
mod error;
mod notify;
mod webhook;

pub use checkout::{parse_currency, IntentOptions, PaymentIntentCreated, StripeClient};
pub use donation::{format_amount, Address, DonationMethod, DonationRequest, DonationSummary};
pub use error::{PaymentError, Result};
pub use notify::{
    EmailMessage, LogNotifier, NotificationTemplate, Notifier, SendGridNotifier, Sender,
};
pub use webhook::{
    parse_event, verify_signature, StripeEvent, WebhookEvent, WebhookHandler,
    DEFAULT_TOLERANCE_SECS, PAYMENT_INTENT_SUCCEEDED,
};
