//! Server Configuration
//!
//! Everything is read from the environment (after `.env` is loaded). Stripe
//! and SendGrid credentials are read by their own clients.

use std::path::PathBuf;

use givedesk_payments::{parse_currency, IntentOptions, Sender};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be a boolean, got {value:?}")]
    InvalidBool { key: &'static str, value: String },

    #[error("{0}")]
    Payments(#[from] givedesk_payments::PaymentError),
}

/// Server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,

    /// Directory with the compiled web frontend
    pub static_dir: PathBuf,

    /// Board inbox for donation notifications
    pub board_email: Option<String>,

    pub sender: Sender,

    /// Email the board when an intent is created, not only when it succeeds
    pub notify_on_intent: bool,

    pub intent_options: IntentOptions,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, or a map in tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Sender::default();

        let currency = match get("PAYMENT_CURRENCY") {
            Some(code) => parse_currency(&code)?,
            None => IntentOptions::default().currency,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "static".into()).into(),
            board_email: get("BOARD_EMAIL"),
            sender: Sender {
                email: get("FROM_EMAIL").unwrap_or(defaults.email),
                name: get("FROM_NAME").unwrap_or(defaults.name),
            },
            notify_on_intent: parse_bool("NOTIFY_ON_INTENT", get("NOTIFY_ON_INTENT"), true)?,
            intent_options: IntentOptions {
                create_customer: parse_bool("CREATE_CUSTOMER", get("CREATE_CUSTOMER"), false)?,
                currency,
            },
        })
    }
}

fn parse_bool(
    key: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    flag(&value).ok_or(ConfigError::InvalidBool { key, value })
}

/// Reads `1/true/yes/on` and `0/false/no/off`, case-insensitively
pub fn flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
