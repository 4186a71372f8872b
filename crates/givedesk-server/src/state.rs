//! Application State

use std::sync::Arc;

use givedesk_payments::{IntentOptions, NotificationTemplate, Notifier, StripeClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stripe client (optional - None if not configured)
    pub stripe: Option<Arc<StripeClient>>,

    /// Email backend (SendGrid, or log-only)
    pub notifier: Arc<dyn Notifier>,

    /// Board notification templates
    pub templates: Arc<NotificationTemplate>,

    pub intent_options: Arc<IntentOptions>,

    /// Also email the board when a donor starts a payment
    pub notify_on_intent: bool,
}
