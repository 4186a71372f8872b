//! Board Notifications
//!
//! Formats donation emails and delivers them through a transactional email
//! provider. SendGrid is the production backend; `LogNotifier` stands in when
//! no API key is configured.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::donation::{format_amount, format_timestamp, DonationRequest, DonationSummary};
use crate::error::{PaymentError, Result};

pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

pub const DEFAULT_FROM_EMAIL: &str = "no-reply@ghkmusicfoundation.org";
pub const DEFAULT_FROM_NAME: &str = "GHK Music Foundation";

/// Sender identity shown to the board
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

impl Default for Sender {
    fn default() -> Self {
        Self {
            email: DEFAULT_FROM_EMAIL.into(),
            name: DEFAULT_FROM_NAME.into(),
        }
    }
}

/// A plain-text notification email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub from: Sender,
    pub subject: String,
    pub body: String,
}

/// Delivers notification emails
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    /// Backend name for health output and logs
    fn name(&self) -> &'static str;

    /// Whether messages actually leave the process
    fn delivers(&self) -> bool {
        true
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Builds the two donation emails sent to the board
#[derive(Clone, Debug)]
pub struct NotificationTemplate {
    /// Board inbox that receives every notification
    pub board_email: String,
    pub sender: Sender,
}

impl NotificationTemplate {
    pub fn new(board_email: impl Into<String>, sender: Sender) -> Self {
        Self {
            board_email: board_email.into(),
            sender,
        }
    }

    /// Email sent when a donor starts a payment
    pub fn intent_created(&self, request: &DonationRequest, now: DateTime<Utc>) -> EmailMessage {
        let body = format!(
            "\nA new donation has been initiated:\n\
             Name: {}\n\
             Email: {}\n\
             Phone: {}\n\
             Address: {}\n\
             Method: {}\n\
             Amount: {}\n\
             Date: {}\n",
            request.name,
            request.email,
            request.phone.as_deref().unwrap_or_default(),
            request.address,
            request.method.long_label(),
            format_amount(request.amount),
            format_timestamp(now),
        );

        EmailMessage {
            to: self.board_email.clone(),
            from: self.sender.clone(),
            subject: format!(
                "New Donation ({}) from {}",
                request.method.short_label(),
                request.name
            ),
            body,
        }
    }

    /// Email sent once Stripe reports the payment succeeded
    pub fn payment_received(&self, summary: &DonationSummary) -> EmailMessage {
        let body = format!(
            "\nA new donation has been received:\n\
             Name: {}\n\
             Email: {}\n\
             Phone: {}\n\
             Address: {}\n\
             Method: {}\n\
             Amount: {}\n\
             Date: {}\n",
            summary.name,
            summary.email,
            summary.phone.as_deref().unwrap_or("N/A"),
            summary.address,
            summary.method.long_label(),
            format_amount(summary.amount_cents),
            format_timestamp(summary.created),
        );

        EmailMessage {
            to: self.board_email.clone(),
            from: self.sender.clone(),
            subject: format!(
                "New Donation ({}) from {}",
                summary.method.long_label(),
                summary.name
            ),
            body,
        }
    }
}

// ============================================================================
// SendGrid
// ============================================================================

#[derive(Debug, Serialize)]
struct SendGridAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization<'a> {
    to: Vec<SendGridAddress<'a>>,
    subject: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<SendGridPersonalization<'a>>,
    from: SendGridAddress<'a>,
    content: Vec<SendGridContent<'a>>,
}

impl<'a> From<&'a EmailMessage> for SendGridRequest<'a> {
    fn from(message: &'a EmailMessage) -> Self {
        Self {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress {
                    email: &message.to,
                    name: None,
                }],
                subject: &message.subject,
            }],
            from: SendGridAddress {
                email: &message.from.email,
                name: Some(&message.from.name),
            },
            content: vec![SendGridContent {
                content_type: "text/plain",
                value: &message.body,
            }],
        }
    }
}

/// SendGrid v3 mail-send backend
pub struct SendGridNotifier {
    api_key: String,
    api_url: String,
    client: Client,
}

impl SendGridNotifier {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            api_url: SENDGRID_API_URL.into(),
            client,
        })
    }

    /// Create from `SENDGRID_API_KEY`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SENDGRID_API_KEY")
            .map_err(|_| PaymentError::Config("SENDGRID_API_KEY not set".into()))?;
        Self::new(api_key)
    }

    /// Point at a different mail-send endpoint
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendGridRequest::from(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Email(format!("{}: {}", status.as_u16(), body)));
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "Sent notification email");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}

// ============================================================================
// Log-only fallback
// ============================================================================

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email delivery disabled - notification logged"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }

    fn delivers(&self) -> bool {
        false
    }
}
