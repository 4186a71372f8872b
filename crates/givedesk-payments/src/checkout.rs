//! Stripe Payment Intents
//!
//! Creates the payment intent behind a donation (the "Stripe Elements"
//! approach: the browser confirms the intent with the returned client secret).

use serde::{Deserialize, Serialize};
use stripe::{
    Client, CreateCustomer, CreatePaymentIntent, Currency, Customer, CustomerId, PaymentIntent,
};

use crate::donation::{Address, DonationRequest};
use crate::error::{PaymentError, Result};

/// Payment method types offered on every donation intent
pub const PAYMENT_METHOD_TYPES: [&str; 2] = ["card", "us_bank_account"];

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    webhook_secret: String,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }

    /// Create a client that talks to a different API base, such as a local mock
    pub fn with_api_base(secret_key: &str, webhook_secret: &str, api_base: &str) -> Result<Self> {
        reqwest::Url::parse(api_base)
            .map_err(|e| PaymentError::Config(format!("Invalid Stripe API base {api_base:?}: {e}")))?;

        Ok(Self {
            client: Client::from_url(api_base, secret_key),
            webhook_secret: webhook_secret.to_string(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| PaymentError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;

        Ok(Self::new(&secret_key, &webhook_secret))
    }

    /// Get the webhook secret
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Create a payment intent for a donation
    ///
    /// When `options.create_customer` is set, a Stripe customer is created
    /// first and attached to the intent.
    pub async fn create_payment_intent(
        &self,
        request: &DonationRequest,
        options: &IntentOptions,
    ) -> Result<PaymentIntentCreated> {
        request.validate()?;

        let customer = if options.create_customer {
            Some(self.create_customer(request).await?)
        } else {
            None
        };

        let mut params = CreatePaymentIntent::new(request.amount, options.currency);
        params.payment_method_types =
            Some(PAYMENT_METHOD_TYPES.iter().map(ToString::to_string).collect());
        params.receipt_email = Some(&request.email);
        params.metadata = Some(request.metadata());
        params.customer = customer.clone();

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| PaymentError::Stripe("No client secret returned".into()))?;

        tracing::info!(
            payment_intent = %intent.id,
            amount = request.amount,
            method = request.method.as_str(),
            "Created payment intent"
        );

        Ok(PaymentIntentCreated {
            id: intent.id.to_string(),
            client_secret,
            customer_id: customer.map(|c| c.to_string()),
        })
    }

    async fn create_customer(&self, request: &DonationRequest) -> Result<CustomerId> {
        let address = request.address.to_string();

        let mut params = CreateCustomer::new();
        params.name = Some(&request.name);
        params.email = Some(&request.email);
        params.phone = request.phone.as_deref();
        params.address = customer_address(&request.address);
        params.metadata = Some(std::collections::HashMap::from([(
            "address".to_string(),
            address,
        )]));

        let customer = Customer::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        tracing::debug!(customer = %customer.id, "Created Stripe customer");

        Ok(customer.id)
    }

    /// Get the underlying Stripe client
    pub const fn inner(&self) -> &Client {
        &self.client
    }
}

/// Structured customer address; `None` without a street line
fn customer_address(address: &Address) -> Option<stripe::Address> {
    let field = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    Some(stripe::Address {
        line1: Some(field(&address.line1)?),
        city: field(&address.city),
        state: field(&address.state),
        postal_code: field(&address.postal_code),
        ..Default::default()
    })
}

/// Per-deployment knobs for intent creation
#[derive(Clone, Debug)]
pub struct IntentOptions {
    /// Also create a Stripe customer record for the donor
    pub create_customer: bool,

    pub currency: Currency,
}

impl Default for IntentOptions {
    fn default() -> Self {
        Self {
            create_customer: false,
            currency: Currency::USD,
        }
    }
}

/// Parse an ISO currency code such as `usd`
pub fn parse_currency(code: &str) -> Result<Currency> {
    serde_json::from_value(serde_json::Value::String(code.trim().to_lowercase()))
        .map_err(|_| PaymentError::Config(format!("Unsupported currency: {code}")))
}

/// Result of creating a payment intent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentIntentCreated {
    /// Stripe payment intent ID
    pub id: String,

    /// Secret the browser uses to confirm the payment
    pub client_secret: String,

    /// Customer created alongside the intent, if any
    pub customer_id: Option<String>,
}
